//! Name → sealed-index lookup, partitioned by dimensionality.

use std::collections::HashMap;

use crate::point_data::PointData;

/// A frozen (after startup ingestion) map from published index name to its
/// sealed [`PointData`], split into a 2-D and a 3-D namespace. A name
/// resolves to exactly one of the two maps; publishing the same name in
/// both is a [`RegistryError::DuplicateName`].
#[derive(Default)]
pub struct Registry {
    two_d: HashMap<String, PointData<2>>,
    three_d: HashMap<String, PointData<3>>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("index name '{0}' is already registered")]
    DuplicateName(String),
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_2d(&mut self, name: impl Into<String>, data: PointData<2>) -> Result<(), RegistryError> {
        let name = name.into();
        if self.two_d.contains_key(&name) || self.three_d.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.two_d.insert(name, data);
        Ok(())
    }

    pub fn insert_3d(&mut self, name: impl Into<String>, data: PointData<3>) -> Result<(), RegistryError> {
        let name = name.into();
        if self.two_d.contains_key(&name) || self.three_d.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }
        self.three_d.insert(name, data);
        Ok(())
    }

    pub fn get_2d(&self, name: &str) -> Option<&PointData<2>> {
        self.two_d.get(name)
    }

    pub fn get_3d(&self, name: &str) -> Option<&PointData<3>> {
        self.three_d.get(name)
    }

    /// True if `name` is registered in either namespace.
    pub fn contains(&self, name: &str) -> bool {
        self.two_d.contains_key(name) || self.three_d.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point2;

    #[test]
    fn lookup_resolves_to_published_index() {
        let mut reg = Registry::new();
        let mut pd: PointData<2> = PointData::new();
        pd.add(Point2::new([1, 1]), vec!["a".into()]).unwrap();
        pd.lock().unwrap();
        reg.insert_2d("cities", pd).unwrap();

        assert!(reg.get_2d("cities").is_some());
        assert!(reg.get_3d("cities").is_none());
        assert!(reg.get_2d("missing").is_none());
    }

    #[test]
    fn duplicate_name_across_dimensionalities_is_rejected() {
        let mut reg = Registry::new();
        reg.insert_2d("poi", PointData::<2>::new()).unwrap();
        let err = reg.insert_3d("poi", PointData::<3>::new()).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("poi".to_string()));
    }
}

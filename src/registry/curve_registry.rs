use fnv::FnvHashMap;
use indexmap::IndexMap;

use crate::error::RegistryError;
use crate::plot::renderer::{CurveHandle, Renderer};
use crate::plot::style::CurveStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum RegistryId {
    Spectra,
    Fits,
}

impl std::fmt::Display for RegistryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spectra => write!(f, "spectra"),
            Self::Fits => write!(f, "fits"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedCurve {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub style: CurveStyle,
    pub handle: CurveHandle,
}

/// Names the curves drawn on a renderer. Every name maps to exactly one
/// handle and every handle back to its name.
#[derive(Debug)]
pub struct CurveRegistry {
    id: RegistryId,
    curves: IndexMap<String, NamedCurve>,
    names: FnvHashMap<CurveHandle, String>,
}

impl CurveRegistry {
    pub fn new(id: RegistryId) -> Self {
        Self {
            id,
            curves: IndexMap::new(),
            names: FnvHashMap::default(),
        }
    }

    pub fn id(&self) -> RegistryId {
        self.id
    }

    /// Draws the curve and registers it under `name`. An existing name is never overwritten.
    pub fn add<R: Renderer>(
        &mut self,
        renderer: &mut R,
        name: &str,
        x: Vec<f64>,
        y: Vec<f64>,
        style: CurveStyle,
    ) -> Result<CurveHandle, RegistryError> {
        if self.curves.contains_key(name) {
            log::warn!("The {name} curve has been already plotted in {}", self.id);
            return Err(RegistryError::DuplicateName(name.to_owned()));
        }

        let handle = renderer.draw(name, &x, &y, &style);
        self.names.insert(handle, name.to_owned());
        self.curves.insert(
            name.to_owned(),
            NamedCurve {
                name: name.to_owned(),
                x,
                y,
                style,
                handle,
            },
        );
        log::debug!("Added {name} ({handle}) to {}", self.id);
        Ok(handle)
    }

    pub fn remove<R: Renderer>(
        &mut self,
        renderer: &mut R,
        name: &str,
    ) -> Result<NamedCurve, RegistryError> {
        let curve = self
            .curves
            .shift_remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))?;
        self.names.remove(&curve.handle);
        renderer.undraw(curve.handle);
        log::debug!("Removed {name} from {}", self.id);
        Ok(curve)
    }

    pub fn find_name_by_handle(&self, handle: CurveHandle) -> Option<&str> {
        self.names.get(&handle).map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&NamedCurve> {
        self.curves.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.curves.contains_key(name)
    }

    /// Oldest curve still registered.
    pub fn first(&self) -> Option<&NamedCurve> {
        self.curves.values().next()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.curves.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedCurve> {
        self.curves.values()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::surface::PlotSurface;

    fn is_bijection(registry: &CurveRegistry) -> bool {
        registry.names.len() == registry.curves.len()
            && registry
                .iter()
                .all(|curve| registry.find_name_by_handle(curve.handle) == Some(curve.name.as_str()))
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut surface = PlotSurface::new();
        let mut registry = CurveRegistry::new(RegistryId::Spectra);

        let first = registry
            .add(&mut surface, "g1", vec![0.0], vec![1.0], CurveStyle::spectrum())
            .unwrap();
        let second = registry.add(&mut surface, "g1", vec![0.0], vec![2.0], CurveStyle::spectrum());

        assert_eq!(second, Err(RegistryError::DuplicateName("g1".to_owned())));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("g1").unwrap().y, vec![1.0]);
        assert_eq!(registry.find_name_by_handle(first), Some("g1"));
        assert_eq!(surface.len(), 1);
        assert!(is_bijection(&registry));
    }

    #[test]
    fn remove_undraws_and_forgets_the_handle() {
        let mut surface = PlotSurface::new();
        let mut registry = CurveRegistry::new(RegistryId::Fits);
        let a = registry
            .add(&mut surface, "a", vec![], vec![], CurveStyle::fit())
            .unwrap();
        registry
            .add(&mut surface, "b", vec![], vec![], CurveStyle::fit())
            .unwrap();

        let removed = registry.remove(&mut surface, "a").unwrap();
        assert_eq!(removed.handle, a);
        assert_eq!(registry.find_name_by_handle(a), None);
        assert!(surface.curve(a).is_none());
        assert_eq!(registry.first().unwrap().name, "b");
        assert!(is_bijection(&registry));

        assert_eq!(
            registry.remove(&mut surface, "a"),
            Err(RegistryError::NotFound("a".to_owned()))
        );
    }
}

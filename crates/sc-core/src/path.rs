//! Absolute prim paths (`/World/Geom/Cube`)

use std::fmt;

use serde::{Deserialize, Serialize};

/// Absolute, normalized path identifying a prim on a stage.
///
/// The root is `/`. Every other path is a sequence of `/`-separated
/// identifiers made of ASCII alphanumerics and underscores, not starting
/// with a digit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrimPath(String);

impl PrimPath {
    /// The absolute root path `/`
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse and validate a path string
    pub fn new(path: impl AsRef<str>) -> Result<Self, PathError> {
        let path = path.as_ref();
        if path == "/" {
            return Ok(Self::root());
        }
        let Some(rest) = path.strip_prefix('/') else {
            return Err(PathError::NotAbsolute(path.to_string()));
        };
        for component in rest.split('/') {
            validate_identifier(component).map_err(|_| PathError::InvalidComponent {
                path: path.to_string(),
                component: component.to_string(),
            })?;
        }
        Ok(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Last path component, empty for the root
    pub fn name(&self) -> &str {
        if self.is_root() {
            return "";
        }
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Parent path, `None` for the root
    pub fn parent(&self) -> Option<PrimPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Append a child identifier
    pub fn child(&self, name: &str) -> Result<PrimPath, PathError> {
        validate_identifier(name).map_err(|_| PathError::InvalidComponent {
            path: self.0.clone(),
            component: name.to_string(),
        })?;
        if self.is_root() {
            Ok(Self(format!("/{name}")))
        } else {
            Ok(Self(format!("{}/{name}", self.0)))
        }
    }

    /// True if `self` equals `prefix` or is a descendant of it
    pub fn has_prefix(&self, prefix: &PrimPath) -> bool {
        if prefix.is_root() {
            return true;
        }
        self.0 == prefix.0
            || (self.0.starts_with(&prefix.0) && self.0.as_bytes().get(prefix.0.len()) == Some(&b'/'))
    }

    /// Number of components below the root
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.0.matches('/').count()
        }
    }

    /// Iterate over the ancestors from the root down to the parent
    pub fn ancestors(&self) -> Vec<PrimPath> {
        let mut chain = Vec::with_capacity(self.depth());
        let mut current = self.parent();
        while let Some(path) = current {
            current = path.parent();
            chain.push(path);
        }
        chain.reverse();
        chain
    }
}

fn validate_identifier(name: &str) -> Result<(), ()> {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return Err(()),
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(())
    }
}

impl fmt::Display for PrimPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PrimPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PrimPath> for String {
    fn from(path: PrimPath) -> Self {
        path.0
    }
}

impl std::str::FromStr for PrimPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Prim path errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("Path is not absolute: {0}")]
    NotAbsolute(String),
    #[error("Invalid component '{component}' in path {path}")]
    InvalidComponent { path: String, component: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_parent() {
        let path = PrimPath::new("/World/Geom/Cube").unwrap();
        assert_eq!(path.name(), "Cube");
        assert_eq!(path.depth(), 3);
        assert_eq!(path.parent().unwrap().as_str(), "/World/Geom");
        assert_eq!(
            PrimPath::new("/World").unwrap().parent(),
            Some(PrimPath::root())
        );
        assert_eq!(PrimPath::root().parent(), None);
    }

    #[test]
    fn test_rejects_invalid_paths() {
        assert!(matches!(
            PrimPath::new("World"),
            Err(PathError::NotAbsolute(_))
        ));
        assert!(PrimPath::new("/World//Cube").is_err());
        assert!(PrimPath::new("/World/1Cube").is_err());
        assert!(PrimPath::new("/World/Cu be").is_err());
        assert!(PrimPath::new("/World/").is_err());
    }

    #[test]
    fn test_prefix_is_component_aware() {
        let world = PrimPath::new("/World").unwrap();
        let cube = PrimPath::new("/World/Cube").unwrap();
        let other = PrimPath::new("/WorldTwo").unwrap();
        assert!(cube.has_prefix(&world));
        assert!(world.has_prefix(&world));
        assert!(!other.has_prefix(&world));
        assert!(other.has_prefix(&PrimPath::root()));
    }

    #[test]
    fn test_ancestors_order() {
        let cube = PrimPath::new("/A/B/C").unwrap();
        let names: Vec<_> = cube.ancestors().iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["/", "/A", "/A/B"]);
    }
}

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// A selectable pose and the reference image shown next to the camera feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseEntry {
    pub id: String,
    pub reference_image: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    pose: Vec<PoseEntry>,
}

/// Read-only pose catalog. Its ids are the only valid pose selections.
#[derive(Debug, Clone)]
pub struct PoseCatalog {
    entries: Vec<PoseEntry>,
}

const BUILTIN_POSES: &[(&str, &str)] = &[
    ("Tree Pose", "/poses/tree-pose.jpg"),
    ("Chair Pose", "/poses/Chair Pose.png"),
    ("Cobra Pose", "/poses/Cobra Pose.png"),
    ("Child Pose", "/poses/Child Pose.png"),
    ("Cat Pose", "/poses/Cat Pose.png"),
    ("Crane Pose", "/poses/Crane Pose.png"),
    ("Dolphin Pose", "/poses/Dolphin Pose.png"),
    ("Extended Side Angle Pose", "/poses/Extended Side Angle Pose.png"),
    ("Extended Triangular Pose", "/poses/Extended Triangular Pose.png"),
    ("Featured Peacock Pose", "/poses/Featured Peacock Pose.png"),
    ("Firefly Pose", "/poses/Firefly Pose.png"),
    ("Wall Pose", "/poses/Wall Pose.png"),
    ("Plow Pose", "/poses/Plow Pose.png"),
    ("Balasana", "/poses/Balasana.png"),
    ("Dhanurasana", "/poses/Dhanurasana.png"),
    ("Garudasana", "/poses/Garudasana.png"),
    ("Halasana", "/poses/Halasana.png"),
    ("Hanumasana", "/poses/Hanumasana.png"),
    ("Malasana", "/poses/Malasana.png"),
    ("Marjaryasana", "/poses/Marjaryasana.png"),
    ("Savasana", "/poses/Savasana.png"),
    ("Trikonasana", "/poses/Trikonasana.jpeg"),
    ("Ustrasana", "/poses/Ustrasana.jpeg"),
    ("Virabhadrasana", "/poses/Virabhadrasana.png"),
    ("Virasana", "/poses/Virasanaa.png"),
    ("Adho mukha svanasana", "poses/Adho mukha svanasana.png"),
    ("Adho mukha vrakshasana", "poses/Adho mukha vrakshasana.webp"),
    ("Alonasana", "poses/Alonasana.jpeg"),
    ("Anjaneyasana", "poses/Anjaneyasana.png"),
    ("Ardha chandrasana", "poses/Ardha chandrasana.png"),
    ("Ardha navasana", "poses/Ardha navasana.png"),
    ("Ardha pincha mayurasana", "poses/Ardha pincha mayurasana.jpeg"),
    ("Ashta chandrasana", "poses/Ashta chandrasana.jpeg"),
    ("Baddha konasana", "poses/Baddha konasana.png"),
    ("Godnesspose", "poses/Godnesspose.png"),
    ("Navasana", "poses/Navasana.jpeg"),
    ("Padangusthasana", "poses/Padangusthasana.png"),
    ("Paripurna Navasana", "poses/Paripurna Navasana.png"),
    ("Parsva virabhadrasana", "poses/Parsva virabhadrasana.jpeg"),
    ("Phalakasana", "poses/Phalakasana.jpeg"),
    ("Salamba bhujangasana", "poses/Salamba bhujangasana.png"),
    ("Salamba sarvangasana", "poses/Salamba sarvangasana.png"),
    ("Setu bandha sarvangasana", "poses/Setu bandha sarvangasana.png"),
    ("Setu Bandhasana", "poses/Setu Bandhasana.png"),
    ("Sukhagomukhasana", "poses/Sukhagomukhasana.png"),
    ("Urdhva dhanurasana", "poses/Urdhva dhanurasana.png"),
    ("Urdhva Mukha Svanasana", "poses/Urdhva Mukha Svanasana.jpg"),
    ("Uthitha Hasta Padangusthasana", "poses/Uthitha Hasta Padangusthasana.jpg"),
    ("Utkatasana", "poses/Utkatasana.png"),
    ("Vakrasana", "poses/Vakrasana.png"),
    ("Vasisthasana", "poses/Vasisthasana.jpg"),
];

impl PoseCatalog {
    /// Build a catalog, rejecting empty lists and duplicate ids
    pub fn new(entries: Vec<PoseEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(CatalogError::DuplicatePose {
                    pose: entry.id.clone(),
                });
            }
        }

        Ok(Self { entries })
    }

    /// Catalog shipped with the application
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_POSES
                .iter()
                .map(|(id, image)| PoseEntry {
                    id: (*id).to_string(),
                    reference_image: (*image).to_string(),
                })
                .collect(),
        }
    }

    /// Parse a catalog from TOML (`[[pose]] id = "..." reference_image = "..."`)
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(contents)?;
        Self::new(file.pose)
    }

    /// Load a catalog file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let path = path.as_ref();
        debug!("Loading pose catalog from: {}", path.display());

        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&contents)?;

        info!("Loaded {} poses from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Load from `path` when given, otherwise use the built-in catalog
    pub fn load_or_builtin(path: Option<&str>) -> crate::error::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn resolve(&self, pose_id: &str) -> Result<&PoseEntry, CatalogError> {
        self.entries
            .iter()
            .find(|entry| entry.id == pose_id)
            .ok_or_else(|| CatalogError::UnknownPose {
                pose: pose_id.to_string(),
            })
    }

    pub fn contains(&self, pose_id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == pose_id)
    }

    pub fn reference_image(&self, pose_id: &str) -> Option<&str> {
        self.resolve(pose_id)
            .ok()
            .map(|entry| entry.reference_image.as_str())
    }

    /// Pose ids in catalog order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_str())
    }

    pub fn entries(&self) -> &[PoseEntry] {
        &self.entries
    }

    /// Id following `current` in catalog order, wrapping around
    pub fn next_after(&self, current: Option<&str>, backwards: bool) -> &str {
        let len = self.entries.len();
        let position = current.and_then(|id| self.entries.iter().position(|e| e.id == id));
        let index = match (position, backwards) {
            (None, false) => 0,
            (None, true) => len - 1,
            (Some(i), false) => (i + 1) % len,
            (Some(i), true) => (i + len - 1) % len,
        };
        &self.entries[index].id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog() {
        let catalog = PoseCatalog::builtin();

        assert!(!catalog.is_empty());
        assert_eq!(catalog.ids().next(), Some("Tree Pose"));
        assert_eq!(
            catalog.reference_image("Tree Pose"),
            Some("/poses/tree-pose.jpg")
        );
        assert!(catalog.contains("Vasisthasana"));
        assert!(!catalog.contains("tree pose"));
    }

    #[test]
    fn test_unknown_pose() {
        let catalog = PoseCatalog::builtin();
        match catalog.resolve("Headstand") {
            Err(CatalogError::UnknownPose { pose }) => assert_eq!(pose, "Headstand"),
            other => panic!("Expected UnknownPose, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_duplicate_rejected() {
        assert!(matches!(PoseCatalog::new(Vec::new()), Err(CatalogError::Empty)));

        let entry = PoseEntry {
            id: "Cat Pose".to_string(),
            reference_image: "cat.png".to_string(),
        };
        let result = PoseCatalog::new(vec![entry.clone(), entry]);
        assert!(matches!(result, Err(CatalogError::DuplicatePose { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[pose]]
id = "Warrior"
reference_image = "refs/warrior.png"

[[pose]]
id = "Bridge"
reference_image = "refs/bridge.png"
"#
        )
        .unwrap();

        let catalog = PoseCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["Warrior", "Bridge"]);
        assert_eq!(catalog.reference_image("Bridge"), Some("refs/bridge.png"));
    }

    #[test]
    fn test_empty_file_rejected() {
        let result = PoseCatalog::from_toml_str("");
        assert!(matches!(result, Err(CatalogError::Empty)));
    }

    #[test]
    fn test_next_after_wraps() {
        let catalog = PoseCatalog::new(vec![
            PoseEntry {
                id: "A".to_string(),
                reference_image: "a.png".to_string(),
            },
            PoseEntry {
                id: "B".to_string(),
                reference_image: "b.png".to_string(),
            },
        ])
        .unwrap();

        assert_eq!(catalog.next_after(None, false), "A");
        assert_eq!(catalog.next_after(Some("A"), false), "B");
        assert_eq!(catalog.next_after(Some("B"), false), "A");
        assert_eq!(catalog.next_after(Some("A"), true), "B");
        assert_eq!(catalog.next_after(None, true), "B");
    }
}

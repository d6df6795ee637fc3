//! World Model: the persistent tag id → world pose map.
//!
//! The first tag ever observed defines the world origin and is stored as the
//! identity. Every other entry is surveyed through the camera relative to
//! tags already in the map.
//!
//! A model is either writable (SETUP) or read-only (NAVIGATION). Read-only
//! models reject every `put`; the only way to change them is a whole-map
//! `load`.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use super::TagId;
use super::document::{TagPoseRecord, WorldDocument};
use crate::error::WorldModelError;
use crate::geometry::SE3;

/// Map of tag ids to world→tag poses.
#[derive(Debug, Clone, Default)]
pub struct WorldModel {
    tags: BTreeMap<TagId, SE3>,
    read_only: bool,
}

impl WorldModel {
    /// Empty, writable model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a model from a YAML document and mark it read-only.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self, WorldModelError> {
        let mut model = Self::new();
        model.load_file(path)?;
        model.read_only = true;
        Ok(model)
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Freeze the model: every subsequent `put` fails.
    pub fn set_read_only(&mut self) {
        self.read_only = true;
    }

    /// Pose of `id` in the world frame, if known.
    pub fn get(&self, id: TagId) -> Option<&SE3> {
        self.tags.get(&id)
    }

    pub fn contains(&self, id: TagId) -> bool {
        self.tags.contains_key(&id)
    }

    /// Insert or overwrite the pose of `id`.
    ///
    /// Returns the previous pose when an existing entry was overwritten.
    pub fn put(&mut self, id: TagId, pose: SE3) -> Result<Option<SE3>, WorldModelError> {
        if self.read_only {
            return Err(WorldModelError::ReadOnly(id));
        }

        let previous = self.tags.insert(id, pose);
        if previous.is_some() {
            debug!("{} overwritten in world model", id);
        }
        Ok(previous)
    }

    /// Insert `id` as the world origin.
    pub fn insert_anchor(&mut self, id: TagId) -> Result<(), WorldModelError> {
        self.put(id, SE3::identity())?;
        info!("{} anchors the world frame", id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (TagId, &SE3)> {
        self.tags.iter().map(|(id, pose)| (*id, pose))
    }

    /// Replace the whole map with the document read from `reader`.
    ///
    /// Every entry is validated before anything is replaced; on error the
    /// model is left untouched.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), WorldModelError> {
        let document: WorldDocument = serde_yaml::from_reader(reader)?;

        let tags = document
            .iter()
            .map(|(id, record)| record.to_pose(*id).map(|pose| (*id, pose)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        self.tags = tags;
        Ok(())
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), WorldModelError> {
        let path = path.as_ref();
        self.load(BufReader::new(File::open(path)?))?;
        info!("Loaded {} tags from {}", self.len(), path.display());
        Ok(())
    }

    /// Serialize the whole map as a YAML document.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), WorldModelError> {
        serde_yaml::to_writer(writer, &self.to_document())?;
        Ok(())
    }

    /// Write the map to `path`, going through a sibling temporary file so a
    /// failed write never truncates an existing map.
    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WorldModelError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            self.save(&mut writer)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;

        info!("Saved {} tags to {}", self.len(), path.display());
        Ok(())
    }

    fn to_document(&self) -> WorldDocument {
        self.tags
            .iter()
            .map(|(id, pose)| (*id, TagPoseRecord::from(pose)))
            .collect()
    }
}

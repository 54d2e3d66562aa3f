//! Retention policy: which images survive a run.
//!
//! Applied to an [`Inventory`] in two steps, always in this order: sort each
//! repository's images oldest first, then drop the newest `keep_count` from
//! each list. Whatever is left in the inventory afterwards is deleted.

use crate::inventory::{Image, Inventory};
use serde::{Deserialize, Serialize};


/// Number of images kept per repository unless configured otherwise.
pub const DEFAULT_KEEP_COUNT: usize = 5;

/// Keep the `keep_count` most recently uploaded images per repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    pub keep_count: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_count: DEFAULT_KEEP_COUNT,
        }
    }
}

impl RetentionPolicy {
    /// Creates a policy keeping `keep_count` images per repository.
    pub fn new(keep_count: usize) -> Self {
        Self { keep_count }
    }

    /// Sorts, counts and trims the inventory in place.
    ///
    /// Returns the number of images present before trimming. Afterwards
    /// the inventory holds only deletion candidates, oldest first.
    ///
    /// # Examples
    ///
    /// ```
    /// use libreap::inventory::Inventory;
    /// use libreap::retention::RetentionPolicy;
    ///
    /// let mut inventory = Inventory::new();
    /// let considered = RetentionPolicy::new(5).apply(&mut inventory);
    /// assert_eq!(considered, 0);
    /// ```
    pub fn apply(&self, inventory: &mut Inventory) -> usize {
        sort_images(inventory);
        let considered = inventory.total_images();
        self.trim(inventory);
        considered
    }

    /// Removes the last `keep_count` images of every repository's list.
    ///
    /// Lists are expected to be sorted oldest first; see [`sort_images`].
    pub fn trim(&self, inventory: &mut Inventory) {
        for images in inventory.image_lists_mut() {
            let candidates = images.len().saturating_sub(self.keep_count);
            images.truncate(candidates);
        }
    }
}

/// Orders every repository's images by upload time, oldest first.
///
/// The sort is stable: images uploaded at the same instant keep their
/// listing order.
pub fn sort_images(inventory: &mut Inventory) {
    for images in inventory.image_lists_mut() {
        images.sort_by_key(|image: &Image| image.uploaded_at);
    }
}

// crates/lyt-runtime/src/mgr.rs
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Layout, LayoutError, PackageSource, Result, DEFAULT_SPEED, DEFAULT_VARIANT};

/// Opaque registry handle. Handles are never reused, so a stale handle
/// cannot alias a newer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutHandle(pub u32);

/// Runtime knobs for a [`LayoutMgr`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MgrConfig {
    /// Variant passed to the package source by [`LayoutMgr::make_layout`].
    pub default_variant: u32,
    /// Speed used by [`LayoutMgr::calc_all`].
    pub frame_speed: f32,
}

impl Default for MgrConfig {
    fn default() -> Self {
        Self {
            default_variant: DEFAULT_VARIANT,
            frame_speed: DEFAULT_SPEED,
        }
    }
}

/// Creates, owns and destroys layout instances.
pub struct LayoutMgr<P: PackageSource> {
    package: P,
    config: MgrConfig,
    layouts: BTreeMap<LayoutHandle, Layout>,
    next_handle: u32,
}

impl<P: PackageSource> LayoutMgr<P> {
    pub fn new(package: P) -> Self {
        Self::with_config(package, MgrConfig::default())
    }

    pub fn with_config(package: P, config: MgrConfig) -> Self {
        Self {
            package,
            config,
            layouts: BTreeMap::new(),
            next_handle: 0,
        }
    }

    pub fn config(&self) -> &MgrConfig {
        &self.config
    }

    pub fn package(&self) -> &P {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut P {
        &mut self.package
    }

    pub fn make_layout(&mut self, id: u32) -> Option<LayoutHandle> {
        self.make_layout_variant(id, self.config.default_variant)
    }

    /// Decode a fresh instance of layout `id`. Every call yields an independent layout.
    pub fn make_layout_variant(&mut self, id: u32, variant: u32) -> Option<LayoutHandle> {
        let layout = {
            let Some(name) = self.package.layout_name(id) else {
                warn!("No layout with id {}", id);
                return None;
            };
            let Some(bytes) = self.package.layout_archive(id, variant) else {
                warn!("Layout '{}' has no archive for variant 0x{:X}", name, variant);
                return None;
            };
            match Layout::decode(&bytes, name) {
                Ok(layout) => layout,
                Err(e) => {
                    warn!("Failed to decode layout '{}': {}", name, e);
                    return None;
                }
            }
        };
        Some(self.register(layout))
    }

    pub fn make_layout_by_name(&mut self, name: &str) -> Option<LayoutHandle> {
        match self.package.layout_id(name) {
            Some(id) => self.make_layout(id),
            None => {
                warn!("No layout named '{}'", name);
                None
            }
        }
    }

    /// Register an already decoded layout.
    pub fn register(&mut self, layout: Layout) -> LayoutHandle {
        let handle = LayoutHandle(self.next_handle);
        self.next_handle += 1;
        info!("Created layout '{}' as {:?}", layout.name(), handle);
        self.layouts.insert(handle, layout);
        handle
    }

    pub fn free_layout(&mut self, handle: LayoutHandle) -> Result<()> {
        let layout = self
            .layouts
            .remove(&handle)
            .ok_or(LayoutError::UnknownLayout(handle))?;
        info!("Freed layout '{}' ({:?})", layout.name(), handle);
        Ok(())
    }

    pub fn get(&self, handle: LayoutHandle) -> Option<&Layout> {
        self.layouts.get(&handle)
    }

    pub fn get_mut(&mut self, handle: LayoutHandle) -> Option<&mut Layout> {
        self.layouts.get_mut(&handle)
    }

    pub fn contains(&self, handle: LayoutHandle) -> bool {
        self.layouts.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = LayoutHandle> + '_ {
        self.layouts.keys().copied()
    }

    /// Run one frame on every registered layout. Attached layouts run through their host.
    pub fn calc_all(&mut self) {
        let speed = self.config.frame_speed;
        for layout in self.layouts.values_mut() {
            layout.calc(speed);
        }
    }

    /// Move `child` into main-widget slot `slot` of `parent`.
    ///
    /// On success `child` is no longer registered. On failure the
    /// registry is left unchanged.
    pub fn attach(&mut self, parent: LayoutHandle, slot: u16, child: LayoutHandle) -> Result<()> {
        if parent == child {
            return Err(LayoutError::SelfAttach);
        }
        if !self.layouts.contains_key(&parent) {
            return Err(LayoutError::UnknownLayout(parent));
        }
        let layout = self
            .layouts
            .remove(&child)
            .ok_or(LayoutError::UnknownLayout(child))?;

        let Some(host) = self.layouts.get_mut(&parent) else {
            self.layouts.insert(child, layout);
            return Err(LayoutError::UnknownLayout(parent));
        };
        match host.attach_layout(slot, layout) {
            Ok(()) => Ok(()),
            Err((e, layout)) => {
                self.layouts.insert(child, layout);
                Err(e)
            }
        }
    }

    /// Take the layout out of `parent`'s slot and register it under a new handle.
    pub fn detach(&mut self, parent: LayoutHandle, slot: u16) -> Result<LayoutHandle> {
        let host = self
            .layouts
            .get_mut(&parent)
            .ok_or(LayoutError::UnknownLayout(parent))?;
        let layout = host.detach_layout(slot)?;
        Ok(self.register(layout))
    }
}

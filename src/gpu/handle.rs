//! Owning GPU object handles.
//!
//! A handle is created exactly once, by the loader that allocated the GL
//! name, and released exactly once, by moving it out of an `Option` slot.
//! The slot is left `None`, so releasing again is a no-op; a handle cannot
//! be copied, so there is never a stale second copy to release.
//!
//! Handles also record their [`ContextId`]. Binding, updating or releasing
//! a handle through a backend of another context is refused with an error
//! log; the call does nothing and a released handle stays in its slot.
//!
//! Dropping a handle without releasing it leaks the GL object. Debug builds
//! log a warning when that happens.

use std::fmt;

use super::{BufferTarget, BufferUsage, ContextId, GpuBackend, RawId};
use crate::error::{LoadError, Result};

/// Common surface of the owning handle types.
pub trait GpuHandle {
    /// Human-readable object kind, used in logs.
    const KIND: &'static str;

    /// GL object name.
    fn raw(&self) -> RawId;

    /// Context that created the object.
    fn owner(&self) -> ContextId;

    /// GL object name as a plain integer (never zero).
    fn id(&self) -> u32 {
        self.raw().get()
    }
}

macro_rules! owned_handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(PartialEq, Eq, Hash)]
        pub struct $name {
            raw: RawId,
            owner: ContextId,
        }

        impl $name {
            pub(crate) fn new(raw: RawId, owner: ContextId) -> Self {
                Self { raw, owner }
            }
        }

        impl GpuHandle for $name {
            const KIND: &'static str = $kind;

            fn raw(&self) -> RawId {
                self.raw
            }

            fn owner(&self) -> ContextId {
                self.owner
            }
        }

        #[cfg(debug_assertions)]
        impl Drop for $name {
            fn drop(&mut self) {
                log::warn!(
                    "{} {} dropped without being released, the GL object leaks",
                    $kind,
                    self.raw
                );
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.raw)
            }
        }
    };
}

owned_handle!(
    /// A linked shader program.
    Program,
    "program"
);
owned_handle!(
    /// A 2D texture.
    Texture,
    "texture"
);
owned_handle!(
    /// A vertex or index buffer.
    Buffer,
    "buffer"
);
owned_handle!(
    /// A vertex array object.
    VertexArray,
    "vertex array"
);

/// Whether `handle` was created by `gpu`'s context. Logs an error naming
/// `action` when it was not.
pub(crate) fn owned_by<H: GpuHandle>(gpu: &dyn GpuBackend, handle: &H, action: &str) -> bool {
    if handle.owner() == gpu.context_id() {
        return true;
    }
    log::error!(
        "refusing to {action} {} {} through a context that did not create it",
        H::KIND,
        handle.raw()
    );
    false
}

/// Moves the handle out of `slot` if it belongs to `gpu`'s context.
///
/// Returns the raw name to delete, or `None` when the slot was empty or the
/// handle belongs to another context (in which case it is put back).
pub(crate) fn take_for_release<H: GpuHandle>(
    gpu: &dyn GpuBackend,
    slot: &mut Option<H>,
) -> Option<RawId> {
    if !owned_by(gpu, slot.as_ref()?, "release") {
        return None;
    }
    let handle = slot.take()?;
    let raw = handle.raw();
    // The name is about to be deleted; nothing leaks.
    std::mem::forget(handle);
    Some(raw)
}

impl Program {
    /// Makes this program current. No-op for a foreign context.
    pub fn bind(&self, gpu: &dyn GpuBackend) {
        if owned_by(gpu, self, "bind") {
            gpu.use_program(Some(self.raw));
        }
    }
}

impl Texture {
    /// Binds this texture to texture unit `unit`. No-op for a foreign
    /// context.
    pub fn bind(&self, gpu: &dyn GpuBackend, unit: u32) {
        if owned_by(gpu, self, "bind") {
            gpu.bind_texture(unit, Some(self.raw));
        }
    }
}

impl Buffer {
    /// Allocates a buffer and fills it with `data`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ResourceCreation`] if the backend cannot
    /// allocate a buffer name.
    pub fn create(
        gpu: &dyn GpuBackend,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<Self> {
        let raw = gpu
            .create_buffer()
            .map_err(|reason| LoadError::ResourceCreation {
                object: Self::KIND,
                reason,
            })?;
        gpu.upload_buffer(raw, target, data, usage);
        Ok(Self::new(raw, gpu.context_id()))
    }

    /// Replaces the buffer contents. No-op for a foreign context.
    pub fn update(
        &self,
        gpu: &dyn GpuBackend,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) {
        if owned_by(gpu, self, "update") {
            gpu.upload_buffer(self.raw, target, data, usage);
        }
    }

    /// Binds the buffer to `target`. No-op for a foreign context.
    pub fn bind(&self, gpu: &dyn GpuBackend, target: BufferTarget) {
        if owned_by(gpu, self, "bind") {
            gpu.bind_buffer(target, Some(self.raw));
        }
    }

    /// Releases the buffer in `slot`, leaving `None`. No-op on `None`.
    pub fn release(gpu: &dyn GpuBackend, slot: &mut Option<Self>) {
        if let Some(raw) = take_for_release(gpu, slot) {
            gpu.delete_buffer(raw);
        }
    }
}

impl VertexArray {
    /// Allocates an empty vertex array.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ResourceCreation`] if the backend cannot
    /// allocate a vertex array name.
    pub fn create(gpu: &dyn GpuBackend) -> Result<Self> {
        let raw = gpu
            .create_vertex_array()
            .map_err(|reason| LoadError::ResourceCreation {
                object: Self::KIND,
                reason,
            })?;
        Ok(Self::new(raw, gpu.context_id()))
    }

    /// Binds the vertex array. No-op for a foreign context.
    pub fn bind(&self, gpu: &dyn GpuBackend) {
        if owned_by(gpu, self, "bind") {
            gpu.bind_vertex_array(Some(self.raw));
        }
    }

    /// Releases the vertex array in `slot`, leaving `None`. No-op on `None`.
    pub fn release(gpu: &dyn GpuBackend, slot: &mut Option<Self>) {
        if let Some(raw) = take_for_release(gpu, slot) {
            gpu.delete_vertex_array(raw);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::headless::HeadlessGpu;

    #[test]
    fn release_empties_slot_and_second_release_is_noop() {
        let gpu = HeadlessGpu::new();
        let buffer =
            Buffer::create(&gpu, BufferTarget::Vertex, &[1, 2, 3], BufferUsage::Static).unwrap();
        let mut slot = Some(buffer);
        assert_eq!(gpu.live_objects().buffers, 1);

        Buffer::release(&gpu, &mut slot);
        assert!(slot.is_none());
        assert_eq!(gpu.live_objects().buffers, 0);

        Buffer::release(&gpu, &mut slot);
        assert_eq!(gpu.live_objects().buffers, 0);
    }

    #[test]
    fn foreign_context_cannot_release() {
        let owner = HeadlessGpu::new();
        let other = HeadlessGpu::new();
        let mut slot = Some(VertexArray::create(&owner).unwrap());

        VertexArray::release(&other, &mut slot);
        assert!(slot.is_some());
        assert_eq!(owner.live_objects().vertex_arrays, 1);

        VertexArray::release(&owner, &mut slot);
        assert!(slot.is_none());
        assert_eq!(owner.live_objects().vertex_arrays, 0);
    }

    #[test]
    fn buffer_keeps_uploaded_bytes() {
        let gpu = HeadlessGpu::new();
        let buffer =
            Buffer::create(&gpu, BufferTarget::Index, &[9, 8, 7, 6], BufferUsage::Static).unwrap();
        assert_eq!(gpu.buffer_contents(buffer.id()).unwrap(), vec![9, 8, 7, 6]);
        buffer.update(&gpu, BufferTarget::Index, &[1], BufferUsage::Stream);
        assert_eq!(gpu.buffer_contents(buffer.id()).unwrap(), vec![1]);
        Buffer::release(&gpu, &mut Some(buffer));
    }

    #[test]
    fn foreign_context_cannot_bind_or_update() {
        let owner = HeadlessGpu::new();
        let other = HeadlessGpu::new();
        let vertices =
            Buffer::create(&owner, BufferTarget::Vertex, &[1, 2], BufferUsage::Static).unwrap();
        let vertex_array = VertexArray::create(&owner).unwrap();
        let texture = Texture::new(owner.create_texture().unwrap(), owner.context_id());
        // Same names on the other context, so a leaked call would be visible.
        let twin = Buffer::create(&other, BufferTarget::Vertex, &[5], BufferUsage::Static).unwrap();
        assert_eq!(twin.id(), vertices.id());

        vertices.bind(&other, BufferTarget::Vertex);
        vertices.update(&other, BufferTarget::Vertex, &[7, 7, 7], BufferUsage::Stream);
        vertex_array.bind(&other);
        texture.bind(&other, 0);
        assert_eq!(other.bound_buffer(BufferTarget::Vertex), None);
        assert_eq!(other.buffer_contents(twin.id()).unwrap(), vec![5]);
        assert_eq!(other.bound_vertex_array(), None);
        assert_eq!(other.bound_texture(0), None);

        vertices.bind(&owner, BufferTarget::Vertex);
        vertex_array.bind(&owner);
        texture.bind(&owner, 0);
        assert_eq!(owner.bound_buffer(BufferTarget::Vertex), Some(vertices.id()));
        assert_eq!(owner.bound_vertex_array(), Some(vertex_array.id()));
        assert_eq!(owner.bound_texture(0), Some(texture.id()));

        Buffer::release(&owner, &mut Some(vertices));
        VertexArray::release(&owner, &mut Some(vertex_array));
        owner.delete_texture(texture.raw());
        std::mem::forget(texture);
        Buffer::release(&other, &mut Some(twin));
    }

    #[test]
    fn dropping_without_release_leaks_the_object() {
        let gpu = HeadlessGpu::new();
        drop(VertexArray::create(&gpu).unwrap());
        assert_eq!(gpu.live_objects().vertex_arrays, 1);
    }
}

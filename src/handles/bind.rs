/*!
Bind targets and their normalized binding categories.

The consistency check on a tracking record needs to know which binding an
object was first attached to, and texture targets in particular are not
one-to-one with bindings: all six cube map faces bind through the single cube
map binding. This module is the small lookup that collapses a target to its
binding category. Stateless.
*/

/// A bind target as observed at the interception layer.
///
/// `None` stands for handle-free (DSA-style) calls where no target is named;
/// the consistency check skips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum BindTarget {
    #[default]
    None,
    Texture1D,
    Texture1DArray,
    Texture2D,
    Texture2DArray,
    Texture2DMultisample,
    Texture2DMultisampleArray,
    Texture3D,
    TextureCubeMap,
    TextureCubeMapPositiveX,
    TextureCubeMapNegativeX,
    TextureCubeMapPositiveY,
    TextureCubeMapNegativeY,
    TextureCubeMapPositiveZ,
    TextureCubeMapNegativeZ,
    TextureCubeMapArray,
    TextureRectangle,
    TextureBuffer,
    ArrayBuffer,
    ElementArrayBuffer,
    UniformBuffer,
    ShaderStorageBuffer,
    AtomicCounterBuffer,
    TransformFeedbackBuffer,
    DrawIndirectBuffer,
    DispatchIndirectBuffer,
    PixelPackBuffer,
    PixelUnpackBuffer,
    CopyReadBuffer,
    CopyWriteBuffer,
    QueryBuffer,
}

/// The normalized binding a target resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum BindCategory {
    Texture1D,
    Texture1DArray,
    Texture2D,
    Texture2DArray,
    Texture2DMultisample,
    Texture2DMultisampleArray,
    Texture3D,
    TextureCubeMap,
    TextureCubeMapArray,
    TextureRectangle,
    TextureBuffer,
    VertexData,
    IndexData,
    UniformData,
    StorageData,
    AtomicCounterData,
    FeedbackData,
    IndirectDraw,
    IndirectDispatch,
    PixelPack,
    PixelUnpack,
    CopyRead,
    CopyWrite,
    QueryResult,
}

impl BindTarget {
    /// The binding this target attaches through, or `None` for
    /// [`BindTarget::None`]. Cube map faces collapse to the cube map binding.
    pub fn binding(self) -> Option<BindCategory> {
        use BindCategory as C;
        use BindTarget as T;
        let category = match self {
            T::None => return None,
            T::Texture1D => C::Texture1D,
            T::Texture1DArray => C::Texture1DArray,
            T::Texture2D => C::Texture2D,
            T::Texture2DArray => C::Texture2DArray,
            T::Texture2DMultisample => C::Texture2DMultisample,
            T::Texture2DMultisampleArray => C::Texture2DMultisampleArray,
            T::Texture3D => C::Texture3D,
            T::TextureCubeMap
            | T::TextureCubeMapPositiveX
            | T::TextureCubeMapNegativeX
            | T::TextureCubeMapPositiveY
            | T::TextureCubeMapNegativeY
            | T::TextureCubeMapPositiveZ
            | T::TextureCubeMapNegativeZ => C::TextureCubeMap,
            T::TextureCubeMapArray => C::TextureCubeMapArray,
            T::TextureRectangle => C::TextureRectangle,
            T::TextureBuffer => C::TextureBuffer,
            T::ArrayBuffer => C::VertexData,
            T::ElementArrayBuffer => C::IndexData,
            T::UniformBuffer => C::UniformData,
            T::ShaderStorageBuffer => C::StorageData,
            T::AtomicCounterBuffer => C::AtomicCounterData,
            T::TransformFeedbackBuffer => C::FeedbackData,
            T::DrawIndirectBuffer => C::IndirectDraw,
            T::DispatchIndirectBuffer => C::IndirectDispatch,
            T::PixelPackBuffer => C::PixelPack,
            T::PixelUnpackBuffer => C::PixelUnpack,
            T::CopyReadBuffer => C::CopyRead,
            T::CopyWriteBuffer => C::CopyWrite,
            T::QueryBuffer => C::QueryResult,
        };
        Some(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_faces_collapse_to_cube_binding() {
        let faces = [
            BindTarget::TextureCubeMapPositiveX,
            BindTarget::TextureCubeMapNegativeX,
            BindTarget::TextureCubeMapPositiveY,
            BindTarget::TextureCubeMapNegativeY,
            BindTarget::TextureCubeMapPositiveZ,
            BindTarget::TextureCubeMapNegativeZ,
        ];
        for face in faces {
            assert_eq!(face.binding(), Some(BindCategory::TextureCubeMap));
        }
        assert_eq!(
            BindTarget::TextureCubeMap.binding(),
            Some(BindCategory::TextureCubeMap)
        );
    }

    #[test]
    fn omitted_target_has_no_binding() {
        assert_eq!(BindTarget::None.binding(), None);
        assert_eq!(BindTarget::default(), BindTarget::None);
    }
}

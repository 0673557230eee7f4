/*!
Resource kinds, context handles, and canonical identities.

Drivers hand out integer "names" for every object an application creates, and
they recycle those names after deletion. A name on its own is therefore not a
stable identity, and neither is a (context, name) pair: depending on the kind
of object and on the driver, the same name may refer to one object shared by a
whole context group, or to distinct objects per context.

[`ResourceIdentity`] folds all of that into a single canonical value: the
sharing group the object actually lives in (or no group at all for kinds the
API shares everywhere), the kind, and the name. Two observations of the same
driver object always produce equal identities, no matter which context of the
sharing group they came through.
*/

pub mod bind;

pub use bind::{BindCategory, BindTarget};

/// Name value drivers use for "no object", alongside plain `0`.
const NULL_NAME: u32 = u32::MAX;

/// The kind of driver object an identity refers to.
///
/// `Unknown` is the zero value and only appears in the null identity.
/// `Special` is the singleton kind for the device/context object itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[non_exhaustive]
pub enum ResourceKind {
    #[default]
    Unknown,
    Special,
    Texture,
    Sampler,
    Framebuffer,
    Renderbuffer,
    Buffer,
    VertexArray,
    Shader,
    Program,
    ProgramPipeline,
    TransformFeedback,
    Query,
    Sync,
}

/// How a kind's objects are shared across the contexts of a sharing group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SharingClass {
    /// Shared across the whole group by API specification.
    Always,
    /// Shared or not depending on the driver; see [`ShareConfig`].
    Vendor,
    /// Never shared; the object belongs to the creating context.
    PerContext,
}

impl ResourceKind {
    fn sharing_class(self) -> SharingClass {
        match self {
            ResourceKind::Texture
            | ResourceKind::Sampler
            | ResourceKind::Buffer
            | ResourceKind::Renderbuffer
            | ResourceKind::Shader
            | ResourceKind::Program
            | ResourceKind::Sync => SharingClass::Always,
            ResourceKind::Framebuffer | ResourceKind::VertexArray => SharingClass::Vendor,
            ResourceKind::Special
            | ResourceKind::ProgramPipeline
            | ResourceKind::TransformFeedback
            | ResourceKind::Query
            | ResourceKind::Unknown => SharingClass::PerContext,
        }
    }
}

/// Opaque handle to an API context, used only as a sharing-group discriminator.
///
/// The interception layer typically derives this from the driver's context
/// pointer. We never dereference it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextHandle(u64);

impl ContextHandle {
    pub fn from_raw(raw: u64) -> Self {
        ContextHandle(raw)
    }
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Vendor-capability flags consumed by identity normalization.
///
/// Resolved once by an external capability detector and injected into the
/// [`Registry`](crate::registry::Registry); read-only afterwards. Defaults to
/// the spec-conformant behavior (framebuffers and vertex arrays per-context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShareConfig {
    /// The driver shares framebuffer objects across a context group.
    pub framebuffers_shared: bool,
    /// The driver shares vertex array objects across a context group.
    pub vertex_arrays_shared: bool,
}

/// Canonical, context-aware identity of one driver object.
///
/// Equal iff all three fields are equal; ordered lexicographically on
/// (sharing group, kind, name) so identities can key ordered maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceIdentity {
    sharing_group: Option<ContextHandle>,
    kind: ResourceKind,
    name: u32,
}

// A field-wise derive would give name 0, which is a different map key than
// the designated null identity even though both mean "no resource".
impl Default for ResourceIdentity {
    fn default() -> Self {
        Self::null()
    }
}

impl ResourceIdentity {
    /// Builds the canonical identity for `(ctx, kind, name)` under `config`.
    ///
    /// Names `0` and all-bits-set resolve to [`ResourceIdentity::null`], as
    /// does [`ResourceKind::Unknown`]. For always-shared kinds the context is
    /// dropped entirely; for vendor-dependent kinds it is dropped only when
    /// the corresponding [`ShareConfig`] flag says the driver shares them.
    pub fn new(config: &ShareConfig, ctx: ContextHandle, kind: ResourceKind, name: u32) -> Self {
        if name == 0 || name == NULL_NAME || kind == ResourceKind::Unknown {
            return Self::null();
        }
        let sharing_group = match kind.sharing_class() {
            SharingClass::Always => None,
            SharingClass::Vendor => {
                let shared = match kind {
                    ResourceKind::Framebuffer => config.framebuffers_shared,
                    ResourceKind::VertexArray => config.vertex_arrays_shared,
                    _ => unreachable!(),
                };
                if shared { None } else { Some(ctx) }
            }
            SharingClass::PerContext => Some(ctx),
        };
        ResourceIdentity {
            sharing_group,
            kind,
            name,
        }
    }

    /// The "no resource" identity, distinct from every real identity.
    pub fn null() -> Self {
        ResourceIdentity {
            sharing_group: None,
            kind: ResourceKind::Unknown,
            name: NULL_NAME,
        }
    }

    pub fn is_null(&self) -> bool {
        self.kind == ResourceKind::Unknown
    }

    pub fn sharing_group(&self) -> Option<ContextHandle> {
        self.sharing_group
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The driver-assigned name. Not replay-safe on its own; see
    /// [`ResourceId`](crate::registry::ResourceId).
    pub fn name(&self) -> u32 {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(n: u64) -> ContextHandle {
        ContextHandle::from_raw(n)
    }

    #[test]
    fn always_shared_kinds_ignore_context() {
        let config = ShareConfig::default();
        for kind in [
            ResourceKind::Texture,
            ResourceKind::Sampler,
            ResourceKind::Buffer,
            ResourceKind::Renderbuffer,
            ResourceKind::Shader,
            ResourceKind::Program,
            ResourceKind::Sync,
        ] {
            let a = ResourceIdentity::new(&config, ctx(1), kind, 7);
            let b = ResourceIdentity::new(&config, ctx(2), kind, 7);
            assert_eq!(a, b, "{kind:?} should be context-independent");
            assert_eq!(a.sharing_group(), None);
        }
    }

    #[test]
    fn per_context_kinds_keep_context() {
        let config = ShareConfig::default();
        for kind in [
            ResourceKind::ProgramPipeline,
            ResourceKind::TransformFeedback,
            ResourceKind::Query,
        ] {
            let a = ResourceIdentity::new(&config, ctx(1), kind, 7);
            let b = ResourceIdentity::new(&config, ctx(2), kind, 7);
            assert_ne!(a, b, "{kind:?} should be context-scoped");
            assert_eq!(a.sharing_group(), Some(ctx(1)));
        }
    }

    #[test]
    fn vendor_flags_decide_framebuffer_and_vao_sharing() {
        let strict = ShareConfig::default();
        let quirky = ShareConfig {
            framebuffers_shared: true,
            vertex_arrays_shared: true,
        };
        let fb_a = ResourceIdentity::new(&strict, ctx(1), ResourceKind::Framebuffer, 3);
        let fb_b = ResourceIdentity::new(&strict, ctx(2), ResourceKind::Framebuffer, 3);
        assert_ne!(fb_a, fb_b);

        let fb_a = ResourceIdentity::new(&quirky, ctx(1), ResourceKind::Framebuffer, 3);
        let fb_b = ResourceIdentity::new(&quirky, ctx(2), ResourceKind::Framebuffer, 3);
        assert_eq!(fb_a, fb_b);

        let vao_a = ResourceIdentity::new(&quirky, ctx(1), ResourceKind::VertexArray, 3);
        let vao_b = ResourceIdentity::new(&quirky, ctx(2), ResourceKind::VertexArray, 3);
        assert_eq!(vao_a, vao_b);
    }

    #[test]
    fn zero_and_all_bits_names_are_null() {
        let config = ShareConfig::default();
        let zero = ResourceIdentity::new(&config, ctx(1), ResourceKind::Texture, 0);
        let all_bits = ResourceIdentity::new(&config, ctx(1), ResourceKind::Texture, u32::MAX);
        assert_eq!(zero, ResourceIdentity::null());
        assert_eq!(all_bits, ResourceIdentity::null());
        assert!(zero.is_null());

        let real = ResourceIdentity::new(&config, ctx(1), ResourceKind::Texture, 1);
        assert!(!real.is_null());
        assert_ne!(real, zero);
    }

    #[test]
    fn default_identity_is_the_null_identity() {
        // default construction must yield the same map key as null(), not a
        // second "unbound" value that merely reports is_null()
        let default = ResourceIdentity::default();
        assert_eq!(default, ResourceIdentity::null());
        assert!(default.is_null());
        assert_eq!(
            default.cmp(&ResourceIdentity::null()),
            std::cmp::Ordering::Equal
        );
        assert_eq!(default.name(), u32::MAX);
    }

    #[test]
    fn ordering_is_strict_and_total() {
        let config = ShareConfig::default();
        let mut ids = vec![
            ResourceIdentity::null(),
            ResourceIdentity::new(&config, ctx(1), ResourceKind::Texture, 1),
            ResourceIdentity::new(&config, ctx(1), ResourceKind::Texture, 2),
            ResourceIdentity::new(&config, ctx(1), ResourceKind::Buffer, 1),
            ResourceIdentity::new(&config, ctx(1), ResourceKind::Query, 1),
            ResourceIdentity::new(&config, ctx(2), ResourceKind::Query, 1),
            ResourceIdentity::new(&config, ctx(2), ResourceKind::Query, 2),
        ];
        ids.sort();
        for window in ids.windows(2) {
            assert!(window[0] < window[1], "{window:?} not strictly increasing");
            assert!(!(window[1] < window[0]));
        }
        for id in &ids {
            assert!(!(id < id), "irreflexivity violated for {id:?}");
        }
        // transitivity over the sorted run
        assert!(ids[0] < ids[2] && ids[2] < ids[4] && ids[0] < ids[4]);
    }
}

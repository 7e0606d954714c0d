use crate::device::DeviceMemory;
use crate::time::{MonotonicSource, SceneClock, TimeSource, TimeState};

use super::{Arena, EntityRegistry, Handle, SceneConfig, SceneError, TimeBinding, TimeBlock};

/// Per-frame composition root: entities, clock and the device time block.
///
/// Lifecycle:
/// 1) `Scene::new` allocates and maps the time block and starts the clock
/// 2) setup registers entities (`add_model` / `add_blades`)
/// 3) each frame calls `update_time` exactly once, then reads `time_binding`
///    and the registry views to record GPU work
/// 4) dropping the scene releases the time block and forgets the handles;
///    entities live in application-owned arenas and are never destroyed here
///
/// Threading: a scene is owned by the render thread. It is neither `Send` nor
/// `Sync` (it holds a mapped pointer), and every mutating call takes `&mut self`.
///
/// The host overwrites the time block while earlier submitted work may still read
/// it. No wait happens here; see [`StalenessPolicy`](super::StalenessPolicy).
#[derive(Debug)]
pub struct Scene<D: DeviceMemory, M, B, S = MonotonicSource> {
    time: TimeState,
    clock: SceneClock<S>,
    registry: EntityRegistry<M, B>,
    time_block: TimeBlock<D>,
}

impl<D: DeviceMemory, M, B> Scene<D, M, B, MonotonicSource> {
    /// Creates a scene timed by the wall clock.
    pub fn new(device: D, config: SceneConfig) -> Result<Self, SceneError> {
        Self::with_time_source(device, config, MonotonicSource)
    }
}

impl<D: DeviceMemory, M, B, S: TimeSource> Scene<D, M, B, S> {
    /// Creates a scene timed by `source`.
    ///
    /// Fails only if the time block cannot be allocated or mapped; nothing is
    /// leaked in that case.
    pub fn with_time_source(device: D, config: SceneConfig, source: S) -> Result<Self, SceneError> {
        let time_block = TimeBlock::new(device, &config.time_block).map_err(|err| {
            log::error!("scene construction failed: {err}");
            SceneError::ResourceAllocation {
                what: "scene time block",
                source: err,
            }
        })?;

        // Started after allocation so setup cost is not billed to frame one.
        let clock = SceneClock::with_source(source, config.clock);

        log::debug!("scene constructed");

        Ok(Self {
            time: TimeState::ZERO,
            clock,
            registry: EntityRegistry::new(),
            time_block,
        })
    }

    // ── registration ──────────────────────────────────────────────────────

    /// Appends a static model. Setup phase only.
    #[inline]
    pub fn add_model(&mut self, model: Handle<M>) {
        self.registry.register_model(model);
    }

    /// Appends a blade field. Setup phase only.
    #[inline]
    pub fn add_blades(&mut self, blades: Handle<B>) {
        self.registry.register_blades(blades);
    }

    /// Models in registration order.
    #[inline]
    pub fn models(&self) -> &[Handle<M>] {
        self.registry.models()
    }

    /// Blade fields in registration order.
    #[inline]
    pub fn blades(&self) -> &[Handle<B>] {
        self.registry.blades()
    }

    #[inline]
    pub fn registry(&self) -> &EntityRegistry<M, B> {
        &self.registry
    }

    /// Registered models that are still alive in `arena`, in registration order.
    pub fn resolve_models<'a>(
        &'a self,
        arena: &'a Arena<M>,
    ) -> impl Iterator<Item = (Handle<M>, &'a M)> + 'a {
        self.registry.resolve_models(arena)
    }

    /// Registered blade fields that are still alive in `arena`, in registration order.
    pub fn resolve_blades<'a>(
        &'a self,
        arena: &'a Arena<B>,
    ) -> impl Iterator<Item = (Handle<B>, &'a B)> + 'a {
        self.registry.resolve_blades(arena)
    }

    // ── time ──────────────────────────────────────────────────────────────

    /// Advances the clock and publishes the result to the device time block.
    ///
    /// Call exactly once per frame, before recording work that reads the block.
    /// Never blocks and never fails.
    pub fn update_time(&mut self) -> TimeState {
        let time = self.clock.advance();

        debug_assert!(
            time.total_time >= self.time.total_time,
            "total time went backwards: {} -> {}",
            self.time.total_time,
            time.total_time
        );

        self.time = time;
        self.time_block.publish(time);
        time
    }

    /// Time state from the latest `update_time` (zero before the first one).
    #[inline]
    pub fn time(&self) -> TimeState {
        self.time
    }

    /// Number of `update_time` calls so far.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.clock.frame_count()
    }

    // ── device ────────────────────────────────────────────────────────────

    /// Device-side handle of the time block, for binding into shader work.
    #[inline]
    pub fn time_buffer(&self) -> &D::Buffer {
        self.time_block.buffer()
    }

    /// Buffer, offset and size holding the latest published time.
    #[inline]
    pub fn time_binding(&self) -> TimeBinding<'_, D::Buffer> {
        self.time_block.binding()
    }

    #[inline]
    pub fn time_block(&self) -> &TimeBlock<D> {
        &self.time_block
    }
}

impl<D: DeviceMemory, M, B, S> Drop for Scene<D, M, B, S> {
    fn drop(&mut self) {
        log::debug!(
            "scene dropped after {} frame(s) ({} models, {} blade fields)",
            self.clock.frame_count(),
            self.registry.model_count(),
            self.registry.blades_count()
        );
        self.registry.clear();
        // `time_block` drops next: unmap, then free.
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::device::{DeviceError, HostMemory};
    use crate::scene::{StalenessPolicy, TimeBlockConfig};
    use crate::time::{ClockConfig, ManualSource};

    #[derive(Debug, PartialEq)]
    struct Model(&'static str);
    #[derive(Debug, PartialEq)]
    struct Blades(&'static str);

    type TestScene = Scene<HostMemory, Model, Blades, ManualSource>;

    fn scene_with(config: SceneConfig) -> (HostMemory, ManualSource, TestScene) {
        let host = HostMemory::new();
        let src = ManualSource::new();
        let scene = Scene::with_time_source(host.clone(), config, src.clone()).unwrap();
        (host, src, scene)
    }

    fn scene() -> (HostMemory, ManualSource, TestScene) {
        scene_with(SceneConfig::default())
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn constructed_scene_is_zeroed_and_mapped() {
        let (host, _src, scene) = scene();

        assert_eq!(scene.time(), TimeState::ZERO);
        assert!(scene.models().is_empty());
        assert!(scene.blades().is_empty());
        assert_eq!(scene.frame_count(), 0);
        assert_eq!(host.contents(scene.time_buffer()), vec![0u8; 8]);
        assert_eq!(host.stats().live_mappings, 1);
    }

    #[test]
    fn oversized_ring_layout_is_an_allocation_error() {
        let host = HostMemory::with_budget(1024);
        let config = SceneConfig {
            time_block: TimeBlockConfig {
                staleness: StalenessPolicy::Ring { frames_in_flight: 2 },
                offset_alignment: u64::MAX / 2 + 1,
                ..TimeBlockConfig::default()
            },
            ..SceneConfig::default()
        };

        let err = Scene::<HostMemory, Model, Blades>::new(host.clone(), config).unwrap_err();
        assert!(matches!(
            err,
            SceneError::ResourceAllocation {
                source: DeviceError::UnsupportedMemory { .. },
                ..
            }
        ));
        assert_eq!(host.stats().allocations, 0);
    }

    #[test]
    fn allocation_failure_is_fatal_and_leak_free() {
        let host = HostMemory::with_budget(0);
        let err = Scene::<HostMemory, Model, Blades>::new(host.clone(), SceneConfig::default())
            .unwrap_err();

        let SceneError::ResourceAllocation { what, source } = err;
        assert_eq!(what, "scene time block");
        assert!(matches!(source, DeviceError::OutOfMemory { .. }));
        assert_eq!(host.stats().live_allocations, 0);
    }

    #[test]
    fn mapping_failure_releases_allocation() {
        let host = HostMemory::new();
        host.fail_next_map("device lost");

        let err = Scene::<HostMemory, Model, Blades>::new(host.clone(), SceneConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SceneError::ResourceAllocation {
                source: DeviceError::MapFailed { .. },
                ..
            }
        ));

        let stats = host.stats();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.frees, 1);
        assert_eq!(stats.live_allocations, 0);
    }

    // ── update_time ───────────────────────────────────────────────────────

    #[test]
    fn immediate_update_reports_near_zero() {
        let (_host, _src, mut scene) = scene();
        let t = scene.update_time();
        assert_eq!(t.total_time, 0.0);
        assert_eq!(t.delta_time, t.total_time);
    }

    #[test]
    fn immediate_update_on_wall_clock_is_small() {
        let mut scene =
            Scene::<HostMemory, Model, Blades>::new(HostMemory::new(), SceneConfig::default())
                .unwrap();
        let t = scene.update_time();
        assert!(t.total_time < 0.5);
        assert_eq!(t.delta_time, t.total_time);
    }

    #[test]
    fn update_tracks_sample_times() {
        let (_host, src, mut scene) = scene();
        let samples = [ms(3), ms(19), ms(20), ms(36), ms(1_250)];

        let mut prev = Duration::ZERO;
        for (k, &at) in samples.iter().enumerate() {
            src.set(at);
            let t = scene.update_time();

            assert_eq!(t.total_time, at.as_secs_f32(), "total after call {k}");
            assert_eq!(t.delta_time, (at - prev).as_secs_f32(), "delta after call {k}");
            assert_eq!(scene.time(), t);
            prev = at;
        }
        assert_eq!(scene.frame_count(), samples.len() as u64);
    }

    #[test]
    fn published_bytes_match_returned_state() {
        let (host, src, mut scene) = scene();

        src.advance(ms(16));
        let t = scene.update_time();
        assert_eq!(host.contents(scene.time_buffer()), t.as_bytes());

        src.advance(ms(17));
        let t = scene.update_time();
        assert_eq!(host.contents(scene.time_buffer()), t.as_bytes());
        assert_eq!(scene.time_block().mapped_bytes(), t.as_bytes());
    }

    #[test]
    fn update_works_with_no_entities() {
        let (_host, src, mut scene) = scene();
        for _ in 0..3 {
            src.advance(ms(10));
            scene.update_time();
        }
        assert!(scene.registry().is_empty());
        assert_eq!(scene.time().total_time, ms(30).as_secs_f32());
    }

    #[test]
    fn default_config_publishes_exact_delta_after_stall() {
        let (host, src, mut scene) = scene();

        src.advance(ms(16));
        scene.update_time();
        src.advance(Duration::from_secs(3));
        let t = scene.update_time();

        assert_eq!(t.delta_time, Duration::from_secs(3).as_secs_f32());
        assert_eq!(host.contents(scene.time_buffer()), t.as_bytes());
    }

    #[test]
    fn clock_clamp_applies_to_published_delta() {
        let (host, src, mut scene) = scene_with(SceneConfig {
            clock: ClockConfig {
                max_delta: Some(ms(100)),
            },
            ..SceneConfig::default()
        });

        src.advance(Duration::from_secs(2));
        let t = scene.update_time();

        assert_eq!(t, TimeState::new(ms(100).as_secs_f32(), 2.0));
        assert_eq!(host.contents(scene.time_buffer()), t.as_bytes());
    }

    #[test]
    fn ring_binding_follows_latest_frame() {
        let (_host, src, mut scene) = scene_with(SceneConfig {
            time_block: TimeBlockConfig {
                staleness: StalenessPolicy::Ring { frames_in_flight: 3 },
                offset_alignment: 64,
                ..TimeBlockConfig::default()
            },
            ..SceneConfig::default()
        });

        let mut offsets = Vec::new();
        for _ in 0..4 {
            src.advance(ms(5));
            scene.update_time();
            offsets.push(scene.time_binding().offset);
        }
        assert_eq!(offsets, vec![0, 64, 128, 0]);
        assert_eq!(scene.time_binding().size, 8);
    }

    // ── registry ──────────────────────────────────────────────────────────

    #[test]
    fn interleaved_registration_scenario() {
        let mut models = Arena::new();
        let mut blades = Arena::new();
        let (_host, _src, mut scene) = scene();

        let a = models.insert(Model("A"));
        let x = blades.insert(Blades("X"));
        let b = models.insert(Model("B"));
        let y = blades.insert(Blades("Y"));
        let c = models.insert(Model("C"));

        scene.add_model(a);
        scene.add_blades(x);
        scene.add_model(b);
        scene.add_blades(y);
        scene.add_model(c);

        assert_eq!(scene.models(), &[a, b, c]);
        assert_eq!(scene.blades(), &[x, y]);

        let names: Vec<_> = scene.resolve_models(&models).map(|(_, m)| m.0).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        let names: Vec<_> = scene.resolve_blades(&blades).map(|(_, b)| b.0).collect();
        assert_eq!(names, vec!["X", "Y"]);
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn drop_releases_block_but_not_entities() {
        let mut models = Arena::new();
        let a = models.insert(Model("A"));

        let (host, _src, mut scene) = scene();
        scene.add_model(a);
        scene.update_time();
        drop(scene);

        let stats = host.stats();
        assert_eq!(stats.maps, 1);
        assert_eq!(stats.unmaps, 1);
        assert_eq!(stats.frees, 1);
        assert_eq!(stats.live_allocations, 0);
        assert_eq!(models.get(a), Some(&Model("A")));
    }

    #[test]
    fn entities_can_outlive_or_predecease_scene() {
        let mut blades = Arena::new();
        let x = blades.insert(Blades("X"));

        let (_host, _src, mut scene) = scene();
        scene.add_blades(x);

        // Entity torn down first: the scene keeps a harmless stale handle.
        blades.remove(x);
        assert_eq!(scene.resolve_blades(&blades).count(), 0);
        assert_eq!(scene.blades(), &[x]);
    }
}

//! Culling demo application
//!
//! Simulates a scene of drifting sprites and runs the full runtime core
//! against it: viewport culling with a spatial grid pre-filter, a bounded
//! texture cache with eviction logging, an input channel adapted through
//! the listener contract, and a clean async shutdown.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scene_runtime::foundation::logging;
use scene_runtime::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const SPRITE_COUNT: u64 = 200;
const FRAME_COUNT: u64 = 120;
const WORLD_EXTENT: f32 = 2000.0;

#[derive(Debug)]
enum DemoEvent {
    SpriteSpawned(u64),
    FrameFinished { frame: u64, visible: usize },
}

/// Input payload delivered by the fake platform channel.
#[derive(Debug)]
struct KeyPress {
    code: u32,
}

/// A listener-style event source standing in for a platform window.
#[derive(Default)]
struct InputChannel {
    listeners: Mutex<HashMap<(String, u64), ListenerFn<KeyPress>>>,
}

impl InputChannel {
    fn fire(&self, event: &str, payload: &KeyPress) {
        let mut listeners = self.listeners.lock().unwrap();
        for ((name, _), handler) in listeners.iter_mut() {
            if name == event {
                handler(payload);
            }
        }
    }
}

impl ListenerTarget for InputChannel {
    type Event = KeyPress;

    fn add_listener(
        &self,
        event: &str,
        id: ListenerId,
        handler: ListenerFn<KeyPress>,
        _options: ListenerOptions,
    ) {
        self.listeners
            .lock()
            .unwrap()
            .insert((event.to_string(), id.0), handler);
    }

    fn remove_listener(&self, event: &str, id: ListenerId) {
        self.listeners
            .lock()
            .unwrap()
            .remove(&(event.to_string(), id.0));
    }
}

struct Sprite {
    id: u64,
    bounds: Rect,
    velocity: (f32, f32),
    depth: f32,
    visible: bool,
}

impl Sprite {
    fn step(&mut self) {
        self.bounds.x = (self.bounds.x + self.velocity.0).rem_euclid(WORLD_EXTENT);
        self.bounds.y = (self.bounds.y + self.velocity.1).rem_euclid(WORLD_EXTENT);
    }
}

impl Renderable for Sprite {
    fn id(&self) -> u64 {
        self.id
    }
    fn bounds(&self) -> Rect {
        self.bounds
    }
    fn is_enabled(&self) -> bool {
        true
    }
    fn is_visible(&self) -> bool {
        self.visible
    }
    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
    fn depth(&self) -> f32 {
        self.depth
    }
}

fn spawn_sprites(rng: &mut StdRng, runtime: &SceneRuntime<DemoEvent>) -> Vec<Sprite> {
    (0..SPRITE_COUNT)
        .map(|id| {
            runtime
                .events()
                .emit("sprite", &DemoEvent::SpriteSpawned(id));
            Sprite {
                id,
                bounds: Rect::new(
                    rng.gen_range(0.0..WORLD_EXTENT),
                    rng.gen_range(0.0..WORLD_EXTENT),
                    rng.gen_range(8.0..64.0),
                    rng.gen_range(8.0..64.0),
                ),
                velocity: (rng.gen_range(-4.0..4.0), rng.gen_range(-4.0..4.0)),
                depth: rng.gen_range(0.0..10.0),
                visible: false,
            }
        })
        .collect()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    log::info!("Starting culling demo");

    let config = RuntimeConfig::new();
    let mut runtime = SceneRuntime::<DemoEvent>::new(config.clone())?;
    runtime.set_viewport(ViewportUpdate {
        x: Some(0.0),
        y: Some(0.0),
        width: Some(800.0),
        height: Some(600.0),
        ..ViewportUpdate::default()
    });

    // A bounded texture cache with every eviction logged.
    let mut texture_cache: BoundedCache<String, Vec<u8>> =
        BoundedCache::new(CacheConfig {
            max_entries: 32,
            ..config.cache
        })
        .with_evict_callback(Box::new(|key, data| {
            log::debug!("Evicting texture '{key}' ({} bytes)", data.len());
        }));

    // Platform input arrives through the listener adapter; its teardown is
    // tracked by the registry, so shutdown detaches it even if we forget.
    let input = Arc::new(InputChannel::default());
    let _key_sub = runtime.events().attach_listener(
        &input,
        "keydown",
        |key: &KeyPress| log::info!("Key pressed: {}", key.code),
        ListenerOptions::default(),
    )?;
    input.fire("keydown", &KeyPress { code: 32 });

    let frame_log = runtime.events().on("frame", |event| {
        if let DemoEvent::FrameFinished { frame, visible } = event {
            if frame % 30 == 0 {
                log::info!("Frame {frame}: {visible} sprite(s) visible");
            }
        }
    });

    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let mut sprites = spawn_sprites(&mut rng, &runtime);
    let mut grid = SpatialGrid::from_objects(&sprites, config.culling.cell_size);
    log::info!(
        "Spawned {} sprite(s) across {} grid cell(s)",
        grid.len(),
        grid.cell_count()
    );

    for frame in 1..=FRAME_COUNT {
        for sprite in &mut sprites {
            sprite.step();
            grid.update(sprite.id, sprite.bounds);
        }

        // Coarse pre-filter: only sprites near the viewport reach the
        // exact cull pass.
        let region = Rect::new(-100.0, -100.0, 1000.0, 800.0);
        let candidates = grid.query(&region);

        let visible = runtime.cull(&mut sprites);
        for sprite in &visible {
            let key = format!("texture-{}", sprite.id());
            if !texture_cache.contains(&key) {
                texture_cache.insert(key, vec![0u8; 4096], 4096);
            }
        }

        log::debug!(
            "Frame {frame}: {} candidate(s), {} visible, cache holds {} texture(s)",
            candidates.len(),
            visible.len(),
            texture_cache.len()
        );
        let count = visible.len();
        runtime.events().emit(
            "frame",
            &DemoEvent::FrameFinished {
                frame,
                visible: count,
            },
        );
    }

    let stats = runtime.cull_stats();
    log::info!(
        "Final frame {}: {}/{} visible in {:?}",
        runtime.frame_count(),
        stats.visible,
        stats.total,
        stats.duration
    );

    frame_log.unsubscribe();
    runtime.shutdown().await;
    log::info!("Culling demo finished");
    Ok(())
}

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A logic thread mutating and publishing while a render thread consumes.
//!
//! Both sides yield at pseudo-random points so the interleaving differs from
//! run to run. Every frame the reader sees must come from a single,
//! completely written draw pass.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use kurbo::{Point, Size, Vec2};
use trellis_core::draw::{DrawNode, DrawPayload, SnapshotReader, SnapshotWriter, snapshot_channel};
use trellis_core::node::{Payload, Scene, SceneConfig};
use trellis_core::resource::ResourceRegistry;
use trellis_render::{DamageRegion, FrameConsumer, RenderPlan, Renderer};

const BOXES: usize = 8;
const FRAMES: u64 = 400;
const EPSILON: f64 = 1e-9;

/// Minimal linear congruential generator for yield points.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn maybe_yield(&mut self) {
        if self.next() % 3 == 0 {
            thread::yield_now();
        }
    }
}

fn seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(1, |elapsed| u64::from(elapsed.subsec_nanos()) | 1)
}

/// Runs a strip of boxes that moves diagonally, publishing one frame per
/// step. Step `s` places the strip at `(s, s / 2)`.
fn spawn_producer(mut writer: SnapshotWriter, done: Arc<AtomicBool>, seed: u64) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut scene = Scene::new(
            SceneConfig::new(Size::new(1000.0, 1000.0)),
            Arc::new(ResourceRegistry::default()),
        );
        let root = scene.root();
        let strip = scene.create_node();
        scene.add_child(root, strip).unwrap();
        for i in 0..BOXES {
            let item = scene.create_node();
            scene.set_size(item, Vec2::new(10.0, 10.0)).unwrap();
            scene.set_position(item, Vec2::new(i as f64 * 10.0, 0.0)).unwrap();
            scene.set_payload(item, Payload::Box).unwrap();
            scene.add_child(strip, item).unwrap();
        }

        let mut rng = Lcg(seed);
        for step in 1..=FRAMES {
            let offset = step as f64;
            scene.set_position(strip, Vec2::new(offset, offset / 2.0)).unwrap();
            let _ = scene.update();
            scene.draw(&mut writer);
            rng.maybe_yield();
        }
        done.store(true, Ordering::Release);
    })
}

/// Checks that every box of a frame was drawn from the same step.
fn assert_consistent(sequence: u64, nodes: &[DrawNode]) {
    assert_eq!(nodes.len(), BOXES + 2, "frame {sequence}: root, strip and boxes");
    let boxes: Vec<_> = nodes
        .iter()
        .filter(|node| matches!(node.payload, DrawPayload::Box))
        .collect();
    assert_eq!(boxes.len(), BOXES, "frame {sequence}: all boxes present");

    let origin = boxes[0].quad.top_left;
    assert!(
        (origin.y - origin.x / 2.0).abs() < EPSILON,
        "frame {sequence}: strip offset {origin:?} is not from a single step"
    );
    for (i, item) in boxes.iter().enumerate() {
        let expected = Point::new(origin.x + i as f64 * 10.0, origin.y);
        assert!(
            (item.quad.top_left - expected).hypot() < EPSILON,
            "frame {sequence}: box {i} at {:?}, expected {expected:?}",
            item.quad.top_left
        );
    }
}

fn read_until_done(reader: &SnapshotReader, done: &AtomicBool, rng: &mut Lcg) -> usize {
    let mut last_sequence = 0;
    let mut frames = 0;
    loop {
        let finished = done.load(Ordering::Acquire);
        if let Some(frame) = reader.acquire() {
            assert!(frame.sequence >= last_sequence, "sequence went backwards");
            last_sequence = frame.sequence;
            assert_consistent(frame.sequence, &frame.nodes);
            frames += 1;
        }
        if finished {
            return frames;
        }
        rng.maybe_yield();
    }
}

#[test]
fn reader_never_observes_a_torn_frame() {
    let seed = seed();
    let (writer, reader) = snapshot_channel();
    let done = Arc::new(AtomicBool::new(false));
    let producer = spawn_producer(writer, Arc::clone(&done), seed);

    let mut rng = Lcg(seed.rotate_left(17));
    let frames = read_until_done(&reader, &done, &mut rng);
    producer.join().unwrap();

    assert!(frames > 0, "seed {seed}: saw at least the final frame");
    assert_eq!(reader.latest_sequence(), Some(FRAMES), "last frame published");
}

#[test]
fn several_readers_see_consistent_frames() {
    let seed = seed();
    let (writer, reader) = snapshot_channel();
    let done = Arc::new(AtomicBool::new(false));
    let producer = spawn_producer(writer, Arc::clone(&done), seed);

    let readers: Vec<_> = (0..2_u64)
        .map(|n| {
            let reader = reader.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || read_until_done(&reader, &done, &mut Lcg(seed ^ (n + 1))))
        })
        .collect();
    producer.join().unwrap();
    for handle in readers {
        assert!(handle.join().unwrap() > 0, "every reader saw a frame");
    }
}

/// Records what it was asked to render.
#[derive(Default)]
struct Recorder {
    sequences: Vec<u64>,
    damage: Vec<DamageRegion>,
}

impl Renderer for Recorder {
    fn render(&mut self, plan: &RenderPlan, damage: &DamageRegion) {
        assert_eq!(plan.items.len(), BOXES, "containers are not render items");
        let first = plan.items[0].quad.top_left;
        for (i, item) in plan.items.iter().enumerate() {
            assert!(
                (item.quad.top_left.x - (first.x + i as f64 * 10.0)).abs() < EPSILON,
                "plan item {i} out of step"
            );
        }
        self.sequences.push(plan.sequence);
        self.damage.push(damage.clone());
    }
}

#[test]
fn consumer_renders_on_its_own_thread() {
    let seed = seed();
    let (writer, reader) = snapshot_channel();
    let done = Arc::new(AtomicBool::new(false));
    let producer = spawn_producer(writer, Arc::clone(&done), seed);

    let render_thread = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut consumer = FrameConsumer::new(reader);
            let mut recorder = Recorder::default();
            let mut rng = Lcg(seed.rotate_right(7));
            loop {
                let finished = done.load(Ordering::Acquire);
                consumer.consume(&mut recorder);
                if finished {
                    // Pick up the final frame if it landed after the last
                    // consume.
                    consumer.consume(&mut recorder);
                    return (consumer.last_sequence(), recorder);
                }
                rng.maybe_yield();
            }
        })
    };

    producer.join().unwrap();
    let (last, recorder) = render_thread.join().unwrap();

    assert_eq!(last, Some(FRAMES), "final frame rendered");
    assert!(
        recorder.sequences.windows(2).all(|pair| pair[0] < pair[1]),
        "each frame rendered at most once, in order"
    );
    assert_eq!(recorder.damage[0], DamageRegion::Full, "first frame is fully damaged");
    assert!(
        recorder.damage[1..].iter().all(|damage| !damage.is_empty()),
        "the strip moves every frame"
    );
}

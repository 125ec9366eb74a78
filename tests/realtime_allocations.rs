use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use vocalshift::{EngineConfig, EnvelopeStrategy, ParamSnapshot, ScaleType, VocalEngine};

struct CountingAllocator;

static TRACK_ALLOCATIONS: AtomicBool = AtomicBool::new(false);
static ALLOC_CALLS: AtomicUsize = AtomicUsize::new(0);
static ALLOC_BYTES: AtomicUsize = AtomicUsize::new(0);
static REALLOC_CALLS: AtomicUsize = AtomicUsize::new(0);
static REALLOC_BYTES: AtomicUsize = AtomicUsize::new(0);

#[global_allocator]
static GLOBAL_ALLOCATOR: CountingAllocator = CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if TRACK_ALLOCATIONS.load(Ordering::Relaxed) {
            ALLOC_CALLS.fetch_add(1, Ordering::Relaxed);
            ALLOC_BYTES.fetch_add(layout.size(), Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if TRACK_ALLOCATIONS.load(Ordering::Relaxed) {
            ALLOC_CALLS.fetch_add(1, Ordering::Relaxed);
            ALLOC_BYTES.fetch_add(layout.size(), Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let out = unsafe { System.realloc(ptr, layout, new_size) };
        if TRACK_ALLOCATIONS.load(Ordering::Relaxed) {
            REALLOC_CALLS.fetch_add(1, Ordering::Relaxed);
            REALLOC_BYTES.fetch_add(new_size, Ordering::Relaxed);
        }
        out
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

fn reset_alloc_counters() {
    ALLOC_CALLS.store(0, Ordering::Relaxed);
    ALLOC_BYTES.store(0, Ordering::Relaxed);
    REALLOC_CALLS.store(0, Ordering::Relaxed);
    REALLOC_BYTES.store(0, Ordering::Relaxed);
}

fn begin_alloc_tracking() {
    reset_alloc_counters();
    TRACK_ALLOCATIONS.store(true, Ordering::SeqCst);
}

fn end_alloc_tracking() -> (usize, usize, usize, usize) {
    TRACK_ALLOCATIONS.store(false, Ordering::SeqCst);
    (
        ALLOC_CALLS.load(Ordering::Relaxed),
        REALLOC_CALLS.load(Ordering::Relaxed),
        ALLOC_BYTES.load(Ordering::Relaxed),
        REALLOC_BYTES.load(Ordering::Relaxed),
    )
}

fn test_signal(len: usize, sample_rate: f32) -> Vec<f32> {
    (0..len)
        .map(|n| {
            let t = n as f32 / sample_rate;
            let voice = (2.0 * std::f32::consts::PI * 203.0 * t).sin() * 0.4
                + (2.0 * std::f32::consts::PI * 406.0 * t).sin() * 0.2;
            // Periodic bursts keep the transient gate busy.
            if (n / 4096) % 3 == 0 && n % 4096 < 600 {
                voice * 3.0
            } else {
                voice
            }
        })
        .collect()
}

#[test]
fn process_block_does_not_allocate_after_configuration() {
    const SAMPLE_RATE: u32 = 44_100;
    const BLOCK_SIZES: [usize; 8] = [1, 64, 127, 256, 511, 1000, 2048, 4097];

    let signal = test_signal(SAMPLE_RATE as usize * 2, SAMPLE_RATE as f32);
    let mut scratch = signal.clone();

    let mut params = ParamSnapshot {
        correction_amount: 0.9,
        correction_speed: 0.3,
        pitch_shift_semitones: 3.0,
        formant_shift_semitones: -2.0,
        breath_amount: 0.4,
        resonance_amount: 0.7,
        resonance_freq_hz: 1800.0,
        key: 2,
        scale: ScaleType::Dorian,
        ai_blend: 0.0,
    };

    for envelope in [EnvelopeStrategy::Lpc, EnvelopeStrategy::MovingAverage] {
        let config = EngineConfig::new(SAMPLE_RATE)
            .with_envelope(envelope)
            .with_preserve_formants(envelope == EnvelopeStrategy::MovingAverage);
        let mut engine = VocalEngine::new(config).expect("valid config");

        begin_alloc_tracking();
        let mut pos = 0;
        let mut block_idx = 0;
        while pos < scratch.len() {
            let size = BLOCK_SIZES[block_idx % BLOCK_SIZES.len()];
            let end = (pos + size).min(scratch.len());
            // Parameter moves that redesign filters and masks mid-stream.
            if block_idx % 10 == 9 {
                params.key = (params.key + 5) % 12;
                params.resonance_freq_hz = 1800.0 + 40.0 * (block_idx % 7) as f32;
                params.scale = ScaleType::from_index(block_idx as u8 % 9);
            }
            engine.process_block(&mut scratch[pos..end], &params);
            pos = end;
            block_idx += 1;
        }
        let (alloc_calls, realloc_calls, alloc_bytes, realloc_bytes) = end_alloc_tracking();

        assert_eq!(
            alloc_calls + realloc_calls,
            0,
            "{:?}: process_block allocated: alloc_calls={}, realloc_calls={}, alloc_bytes={}, realloc_bytes={}",
            envelope,
            alloc_calls,
            realloc_calls,
            alloc_bytes,
            realloc_bytes
        );
        assert!(scratch.iter().all(|v| v.is_finite()));
        scratch.copy_from_slice(&signal);
    }
}

use etchwork::{
    AssetStore, BackendKind, CpuBackend, FrameIndex, RenderSettings, SketchConfig, create_backend,
    render_frame,
};

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for chunk in bytes.chunks(8) {
        let mut v = 0u64;
        for (i, &b) in chunk.iter().enumerate() {
            v |= (b as u64) << (i * 8);
        }
        state = mix64(state ^ v);
    }
    state
}

fn config() -> SketchConfig {
    SketchConfig::from_json(include_str!("data/small_sketch.json")).unwrap()
}

#[test]
fn render_small_sketch_is_deterministic() {
    let cfg = config();
    let assets = AssetStore::empty();

    let mut a = create_backend(BackendKind::Cpu, &RenderSettings::default());
    let mut b = CpuBackend::new(RenderSettings::default());

    for f in [0u64, 6, 13] {
        let fa = render_frame(&cfg, FrameIndex(f), a.as_mut(), &assets).unwrap();
        let fb = render_frame(&cfg, FrameIndex(f), &mut b, &assets).unwrap();
        assert_eq!((fa.width, fa.height), (96, 72));
        assert!(fa.premultiplied);
        assert_eq!(digest_u64(&fa.data), digest_u64(&fb.data), "frame {f}");
    }
}

#[test]
fn rendered_frame_is_opaque_and_has_lines() {
    let cfg = config();
    let frame = render_frame(
        &cfg,
        FrameIndex(0),
        &mut CpuBackend::new(RenderSettings::default()),
        &AssetStore::empty(),
    )
    .unwrap();

    assert!(frame.data.chunks_exact(4).all(|px| px[3] == 255));

    // Without rows the frame is the bare gradient; the sketch must differ from it.
    let bare = SketchConfig {
        rows: vec![],
        ..config()
    };
    let background = render_frame(
        &bare,
        FrameIndex(0),
        &mut CpuBackend::new(RenderSettings::default()),
        &AssetStore::empty(),
    )
    .unwrap();
    let changed = frame
        .data
        .chunks_exact(4)
        .zip(background.data.chunks_exact(4))
        .filter(|(a, b)| a != b)
        .count();
    assert!(changed > 100, "only {changed} pixels changed");
}

#[test]
fn beads_animate_between_frames() {
    let cfg = config();
    let assets = AssetStore::empty();
    let mut backend = CpuBackend::new(RenderSettings::default());
    let a = render_frame(&cfg, FrameIndex(0), &mut backend, &assets).unwrap();
    let b = render_frame(&cfg, FrameIndex(10), &mut backend, &assets).unwrap();
    let c = render_frame(&cfg, FrameIndex(20), &mut backend, &assets).unwrap();
    assert_ne!(digest_u64(&a.data), digest_u64(&b.data));
    assert_eq!(digest_u64(&a.data), digest_u64(&c.data));
}

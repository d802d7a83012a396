use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_etchwork")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "etchwork.exe"
            } else {
                "etchwork"
            });
            p
        })
}

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("cli_smoke").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_config(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("sketch.json");
    std::fs::write(&path, include_str!("data/small_sketch.json")).unwrap();
    path
}

#[test]
fn cli_frame_writes_png() {
    let dir = scratch("frame");
    let cfg = write_config(&dir);
    let out = dir.join("out.png");

    let status = std::process::Command::new(exe())
        .args(["frame", "--frame", "3", "--debug-guides", "--in"])
        .arg(&cfg)
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();

    assert!(status.success());
    let img = image::open(&out).unwrap();
    assert_eq!((img.width(), img.height()), (96, 72));
}

#[test]
fn cli_export_writes_numbered_frames() {
    let dir = scratch("export");
    let cfg = write_config(&dir);
    let frames = dir.join("frames");

    let status = std::process::Command::new(exe())
        .args(["export", "--start", "0", "--end", "3", "--parallel", "--in"])
        .arg(&cfg)
        .arg("--out-dir")
        .arg(&frames)
        .status()
        .unwrap();

    assert!(status.success());
    for name in ["frame000.png", "frame001.png", "frame002.png"] {
        assert!(frames.join(name).is_file(), "{name}");
    }
    assert!(!frames.join("frame003.png").exists());
}

#[test]
fn cli_preset_prints_valid_config() {
    let output = std::process::Command::new(exe())
        .args(["preset", "holiday-card"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    let cfg = etchwork::SketchConfig::from_json(&text).unwrap();
    assert_eq!(cfg.seed, "Penn Engineering");
    assert_eq!(cfg.rows.len(), 3);
}

#[test]
fn cli_rejects_bad_config() {
    let dir = scratch("bad");
    let path = dir.join("bad.json");
    std::fs::write(&path, r#"{"seed": "x"}"#).unwrap();

    let status = std::process::Command::new(exe())
        .args(["frame", "--in"])
        .arg(&path)
        .arg("--out")
        .arg(dir.join("never.png"))
        .status()
        .unwrap();

    assert!(!status.success());
    assert!(!dir.join("never.png").exists());
}

use std::fmt::Write as _;
use std::fs;

use simplot::battery::preset;
use simplot::config::RenderConfig;
use simplot::pipeline::Pipeline;
use simplot::sink::OutputSink;
use tempfile::tempdir;

#[test]
fn pendulum_preset_writes_its_svg() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    fs::write(
        data.path().join("datos_periodo2_vs_largo.txt"),
        "0.20 0.36\n0.35 1.02\n0.50 1.65\n0.65 2.30\n0.80 2.92\n",
    )
    .unwrap();

    let cfg = RenderConfig::default();
    let exp = preset("pendulum", &cfg, data.path(), out.path()).unwrap();
    let mut sink = OutputSink::headless(cfg.text.clone());
    let report = Pipeline::new(exp).run(&mut sink).unwrap();

    let target = out.path().join("grafica_pendulo_simple.svg");
    assert_eq!(report.written, vec![target.clone()]);
    let svg = fs::read_to_string(&target).unwrap();
    assert!(svg.contains("Linear fit"), "legend entry missing");
}

#[test]
fn energy_preset_skips_its_header() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    let mut text = String::from("t E\n");
    for i in 0..50 {
        let t = i as f64 * 0.1;
        writeln!(text, "{t} {}", 0.5 * (1.0 + t.cos())).unwrap();
    }
    fs::write(data.path().join("energia_cinetica.dat"), text).unwrap();

    let mut cfg = RenderConfig::default();
    cfg.figure.dpi = 40;
    let exp = preset("energy", &cfg, data.path(), out.path()).unwrap();
    let mut pipeline = Pipeline::new(exp);
    pipeline.load().unwrap();
    assert_eq!(pipeline.tables().get("energy").unwrap().len(), 50);
}

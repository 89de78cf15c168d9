use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use catalog::DancerCatalog;
use formats::DanceMode;
use foundation::math::LatLon;
use layers::{DeclusterConfig, MarkersLayer, PlacedMarker};
use scene::{Camera2D, FitOptions, MercatorProjector, Viewport, ZoomLimits, fit_camera};
use serde::Serialize;

fn main() {
    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let mut args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let cmd = args[1].clone();
    args.drain(0..2);

    let output = match cmd.as_str() {
        "validate" => cmd_validate(args)?,
        "convert-legacy" => cmd_convert_legacy(args)?,
        "layout" => cmd_layout(args)?,
        "fit" => cmd_fit(args)?,
        _ => return Err(usage()),
    };
    println!("{output}");
    Ok(())
}

/// Positional arguments plus `--flag value` pairs.
#[derive(Debug, Default)]
struct Args {
    positional: Vec<String>,
    flags: HashMap<String, String>,
    switches: Vec<String>,
}

impl Args {
    fn parse(raw: Vec<String>, value_flags: &[&str], switch_flags: &[&str]) -> Result<Self, String> {
        let mut out = Args::default();
        let mut iter = raw.into_iter();
        while let Some(arg) = iter.next() {
            if let Some(name) = arg.strip_prefix("--") {
                if value_flags.contains(&name) {
                    let value = iter
                        .next()
                        .ok_or_else(|| format!("--{name} requires a value"))?;
                    out.flags.insert(name.to_string(), value);
                } else if switch_flags.contains(&name) {
                    out.switches.push(name.to_string());
                } else {
                    return Err(format!("unknown arg: {arg}\n\n{}", usage()));
                }
            } else {
                out.positional.push(arg);
            }
        }
        Ok(out)
    }

    fn switch(&self, name: &str) -> bool {
        self.switches.iter().any(|s| s == name)
    }

    fn f64(&self, name: &str) -> Result<Option<f64>, String> {
        match self.flags.get(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| format!("--{name}: expected a number, got {raw:?}")),
        }
    }

    fn mode(&self) -> Result<DanceMode, String> {
        match self.flags.get("mode") {
            None => Ok(DanceMode::default()),
            Some(raw) => raw.parse().map_err(|e: formats::UnknownDanceMode| e.to_string()),
        }
    }

    fn viewport(&self) -> Result<Viewport, String> {
        let default = Viewport::default();
        Ok(Viewport::new(
            self.f64("width")?.unwrap_or(default.width_px),
            self.f64("height")?.unwrap_or(default.height_px),
        ))
    }
}

fn load_catalog(path: &Path) -> Result<DancerCatalog, String> {
    DancerCatalog::load(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn cmd_validate(args: Vec<String>) -> Result<String, String> {
    // dancemap validate <dancers.json>
    let args = Args::parse(args, &[], &[])?;
    let [path] = args.positional.as_slice() else {
        return Err(usage());
    };
    let catalog = load_catalog(Path::new(path))?;

    let mut out = format!("{path}: {} dancers\n", catalog.len());
    for count in catalog.counts() {
        out.push_str(&format!("  {:<8} {}\n", count.mode.as_str(), count.count));
    }
    out.push_str(&format!("  blake3   {}", catalog.content_hash()));
    Ok(out)
}

fn cmd_convert_legacy(args: Vec<String>) -> Result<String, String> {
    // dancemap convert-legacy <legacy.json> <dancers.json> [--force]
    let args = Args::parse(args, &[], &["force"])?;
    let [input, output] = args.positional.as_slice() else {
        return Err(usage());
    };
    let output = PathBuf::from(output);
    if output.exists() && !args.switch("force") {
        return Err(format!("output already exists: {output:?} (use --force)"));
    }

    let payload = fs::read_to_string(input).map_err(|e| format!("read {input:?}: {e}"))?;
    let legacy = formats::parse_legacy(&payload).map_err(|e| format!("{input}: {e}"))?;
    let records = formats::convert_legacy(&legacy).map_err(|e| format!("{input}: {e}"))?;

    let mut json =
        serde_json::to_string_pretty(&records).map_err(|e| format!("json: {e}"))?;
    json.push('\n');
    fs::write(&output, &json).map_err(|e| format!("write {output:?}: {e}"))?;

    Ok(format!(
        "wrote {} dancers to {} (blake3 {})",
        records.len(),
        output.display(),
        blake3::hash(json.as_bytes()).to_hex()
    ))
}

#[derive(Debug, Serialize)]
struct LayoutReport {
    mode: DanceMode,
    camera: Camera2D,
    viewport: Viewport,
    config: DeclusterConfig,
    displaced: usize,
    markers: Vec<PlacedMarker>,
}

fn cmd_layout(args: Vec<String>) -> Result<String, String> {
    // dancemap layout <dancers.json> [--mode M] [--lat --lon --zoom] [--width --height]
    //   [--overlap-px PX] [--separation-px PX]
    let args = Args::parse(
        args,
        &[
            "mode",
            "lat",
            "lon",
            "zoom",
            "width",
            "height",
            "overlap-px",
            "separation-px",
        ],
        &[],
    )?;
    let [path] = args.positional.as_slice() else {
        return Err(usage());
    };
    let catalog = load_catalog(Path::new(path))?;
    let mode = args.mode()?;
    let viewport = args.viewport()?;

    // Without an explicit view, lay out against the initial framing.
    let camera = match (args.f64("lat")?, args.f64("lon")?, args.f64("zoom")?) {
        (Some(lat), Some(lon), Some(zoom)) => {
            Camera2D::new(LatLon::new(lat, lon), ZoomLimits::default().clamp(zoom))
        }
        (None, None, None) => fitted_camera(&catalog, mode, viewport),
        _ => return Err("--lat, --lon and --zoom must be given together".to_string()),
    };

    let defaults = DeclusterConfig::default();
    let config = DeclusterConfig {
        overlap_threshold_px: args
            .f64("overlap-px")?
            .unwrap_or(defaults.overlap_threshold_px),
        separation_radius_px: args
            .f64("separation-px")?
            .unwrap_or(defaults.separation_radius_px),
    };

    let projector = MercatorProjector::new(camera, viewport);
    let mut layer = MarkersLayer::new(1, config);
    layer.set_dancers(mode, catalog.records_for(mode), Some(&projector));
    let markers = layer.markers();

    let report = LayoutReport {
        mode,
        camera,
        viewport,
        config,
        displaced: markers.iter().filter(|m| m.displaced).count(),
        markers,
    };
    serde_json::to_string_pretty(&report).map_err(|e| format!("json: {e}"))
}

fn cmd_fit(args: Vec<String>) -> Result<String, String> {
    // dancemap fit <dancers.json> [--mode M] [--width W] [--height H]
    let args = Args::parse(args, &["mode", "width", "height"], &[])?;
    let [path] = args.positional.as_slice() else {
        return Err(usage());
    };
    let catalog = load_catalog(Path::new(path))?;
    let mode = args.mode()?;
    let camera = fitted_camera(&catalog, mode, args.viewport()?);
    serde_json::to_string_pretty(&camera).map_err(|e| format!("json: {e}"))
}

fn fitted_camera(catalog: &DancerCatalog, mode: DanceMode, viewport: Viewport) -> Camera2D {
    catalog
        .bounds(mode)
        .map(|bounds| fit_camera(bounds, viewport, FitOptions::dancers(), ZoomLimits::default()))
        .unwrap_or_default()
}

fn usage() -> String {
    let exe = env::args().next().unwrap_or_else(|| "dancemap".to_string());
    format!(
        "Usage:\n  {exe} validate <dancers.json>\n  {exe} convert-legacy <legacy.json> <dancers.json> [--force]\n  {exe} layout <dancers.json> [--mode salsa|bachata] [--lat DEG --lon DEG --zoom Z] [--width PX] [--height PX] [--overlap-px PX] [--separation-px PX]\n  {exe} fit <dancers.json> [--mode salsa|bachata] [--width PX] [--height PX]\n\nNotes:\n- `layout` without --lat/--lon/--zoom uses the initial fitted view.\n- Viewport defaults to 1024x768.\n"
    )
}

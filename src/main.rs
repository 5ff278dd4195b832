use std::env;
use std::fs;

use anyhow::{anyhow, bail, Context, Result};
use glam::{Vec2, Vec3};
use log::info;

use extrude_shading::shader::shader_source;
use extrude_shading::{
    FragmentUniforms, Frame, GpuLight, LayoutReport, Material, MeshVertex, Scene, SolidColor,
    TransformUniforms,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let xml = fs::read_to_string(&options.path)
        .with_context(|| format!("failed to read scene {}", options.path))?;
    let scene = Scene::from_xml(&xml).context("failed to parse scene XML")?;
    info!("parsed {}", options.path);

    println!(
        "Loaded scene with {} models ({} lights)",
        scene.models.len(),
        scene.lights.len()
    );
    for model in &scene.models {
        println!(" - {} (tiling {})", model.name, model.tiling);
    }
    for light in &scene.lights {
        println!(
            " * {} at {} intensity {}",
            light.kind.name(),
            format_vec3(light.position),
            light.intensity
        );
    }

    let frame = Frame::build(&scene);
    println!(
        "Frame: {} draw(s), {} light(s) uploaded, {} dropped",
        frame.draws.len(),
        frame.lights.len(),
        frame.dropped_lights
    );

    if options.layout {
        print_layouts();
    }

    if options.emit_wgsl {
        println!("{}", shader_source());
    }

    if let Some(probe) = options.probe {
        print_probe(&frame, options.model.as_deref(), probe)?;
    }

    Ok(())
}

fn print_layouts() {
    let reports = [
        LayoutReport::of::<TransformUniforms>(),
        LayoutReport::of::<GpuLight>(),
        LayoutReport::of::<FragmentUniforms>(),
        LayoutReport::of::<MeshVertex>(),
    ];
    for report in reports {
        print!("{report}");
    }
}

fn print_probe(frame: &Frame, model: Option<&str>, probe: Probe) -> Result<()> {
    let draw = match model {
        Some(name) => frame
            .draw(name)
            .ok_or_else(|| anyhow!("no model named {name}"))?,
        None => frame
            .draws
            .first()
            .ok_or_else(|| anyhow!("--probe needs at least one model in the scene"))?,
    };
    let color = frame.shade_local(
        draw,
        probe.position,
        probe.normal,
        Vec2::ZERO,
        &Material::default(),
        &SolidColor(draw.base_color),
    );
    println!("Probe on {}: {}", draw.model, format_vec3(color));
    Ok(())
}

fn format_vec3(v: Vec3) -> String {
    format!("{:.3} {:.3} {:.3}", v.x, v.y, v.z)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Probe {
    position: Vec3,
    normal: Vec3,
}

impl Probe {
    fn parse(text: &str) -> Result<Self> {
        let values = text
            .split_whitespace()
            .map(|value| {
                value
                    .parse::<f32>()
                    .map_err(|err| anyhow!("invalid probe value {value:?}: {err}"))
            })
            .collect::<Result<Vec<_>>>()?;
        match values.as_slice() {
            [px, py, pz, nx, ny, nz] => Ok(Self {
                position: Vec3::new(*px, *py, *pz),
                normal: Vec3::new(*nx, *ny, *nz),
            }),
            _ => bail!("--probe expects \"px py pz nx ny nz\", got {} values", values.len()),
        }
    }
}

#[derive(Debug)]
struct CliOptions {
    path: String,
    layout: bool,
    emit_wgsl: bool,
    probe: Option<Probe>,
    model: Option<String>,
}

const USAGE: &str = "Usage: extrude-shading <scene.xml> [--layout] [--emit-wgsl] [--probe \"px py pz nx ny nz\"] [--model <name>]";

impl CliOptions {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let Some(path) = args.next() else {
            return Err(anyhow!(USAGE));
        };
        let mut options = Self {
            path,
            layout: false,
            emit_wgsl: false,
            probe: None,
            model: None,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--layout" => options.layout = true,
                "--emit-wgsl" => options.emit_wgsl = true,
                "--probe" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--probe needs a value. {USAGE}"))?;
                    options.probe = Some(Probe::parse(&value)?);
                }
                "--model" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--model needs a value. {USAGE}"))?;
                    options.model = Some(value);
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parses_flags_and_probe() {
        let options = CliOptions::parse(args(&[
            "scene.xml",
            "--layout",
            "--probe",
            "0 0 0 0 1 0",
            "--model",
            "Title",
        ]))
        .unwrap();
        assert_eq!(options.path, "scene.xml");
        assert!(options.layout);
        assert!(!options.emit_wgsl);
        assert_eq!(
            options.probe,
            Some(Probe {
                position: Vec3::ZERO,
                normal: Vec3::Y
            })
        );
        assert_eq!(options.model.as_deref(), Some("Title"));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(CliOptions::parse(args(&[])).is_err());
        assert!(CliOptions::parse(args(&["a.xml", "--bogus"])).is_err());
        assert!(CliOptions::parse(args(&["a.xml", "--probe"])).is_err());
        assert!(CliOptions::parse(args(&["a.xml", "--probe", "1 2 3"])).is_err());
    }
}

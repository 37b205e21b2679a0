use log::{error, info, warn};
use lumino::display::{SdlPresenter, SdlWindow};
use lumino::{Backend, Color, Light, Renderer, RendererConfig, Sprite};
use std::time::Instant;

const CONFIG_PATH: &str = "lumino.json";

struct Options {
    config: Option<String>,
    scale: Option<u32>,
    size: Option<(u32, u32)>,
    sprites: Vec<String>,
    scalar: bool,
    vsync: bool,
    save_config: bool,
}

/// Parse command line arguments
fn parse_args() -> Options {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = Options {
        config: None,
        scale: None,
        size: None,
        sprites: Vec::new(),
        scalar: false,
        vsync: true,
        save_config: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--no-vsync" => opts.vsync = false,
            "--scalar" => opts.scalar = true,
            "--save-config" => opts.save_config = true,
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    opts.config = Some(args[i + 1].clone());
                    i += 1;
                }
            },
            "--scale" | "-s" => {
                if i + 1 < args.len() {
                    if let Ok(s) = args[i + 1].parse::<u32>() {
                        opts.scale = Some(s);
                    }
                    i += 1;
                }
            },
            "--size" => {
                if i + 1 < args.len() {
                    // Parse WxH format (e.g., 160x120)
                    let parts: Vec<&str> = args[i + 1].split('x').collect();
                    if parts.len() == 2 {
                        if let (Ok(w), Ok(h)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>()) {
                            opts.size = Some((w, h));
                        }
                    }
                    i += 1;
                }
            },
            "--sprite" => {
                if i + 1 < args.len() {
                    opts.sprites.push(args[i + 1].clone());
                    i += 1;
                }
            },
            "--help" => {
                println!("Usage: lumino [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --config PATH, -c PATH  Renderer config JSON (default: {} if present)", CONFIG_PATH);
                println!("  --scale N, -s N         Upscale factor: 1, 2, 4 or 8");
                println!("  --size WxH              Internal resolution (e.g., 160x120)");
                println!("  --sprite PATH           PNG sprite to draw (repeatable)");
                println!("  --scalar                Force the scalar kernels");
                println!("  --no-vsync              Disable VSync for uncapped framerate");
                println!("  --save-config           Write the effective config to {}", CONFIG_PATH);
                println!("  --help                  Show this help message");
                std::process::exit(0);
            },
            other => warn!("ignoring unknown argument {}", other),
        }
        i += 1;
    }

    opts
}

/// Shaded disc used when no sprite files are given
fn default_sprite(size: u32) -> Option<Sprite> {
    let r = size as f32 / 2.0;
    let pixels = (0..size * size)
        .map(|i| {
            let dx = (i % size) as f32 + 0.5 - r;
            let dy = (i / size) as f32 + 0.5 - r;
            let d = (dx * dx + dy * dy).sqrt() / r;
            if d > 1.0 {
                Color::TRANSPARENT
            } else {
                let shade = (255.0 * (1.0 - d * 0.6)) as u8;
                Color::rgb(shade, shade / 2 + 60, 255 - shade / 3)
            }
        })
        .collect();
    Sprite::from_colors(size, size, pixels)
}

fn load_config(opts: &Options) -> Result<RendererConfig, String> {
    let mut config = match &opts.config {
        Some(path) => RendererConfig::load(path).map_err(|e| format!("{}: {}", path, e))?,
        None => RendererConfig::load(CONFIG_PATH).unwrap_or_default(),
    };
    if let Some(scale) = opts.scale {
        config.upscale = scale;
    }
    if let Some((w, h)) = opts.size {
        config.width = w;
        config.height = h;
    }
    if opts.scalar {
        config.backend = Backend::Scalar;
    }
    Ok(config)
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = parse_args();
    let config = load_config(&opts)?;
    if opts.save_config {
        config.save(CONFIG_PATH)?;
        info!("config saved to {}", CONFIG_PATH);
    }

    let mut renderer = Renderer::new(&config).map_err(|e| {
        error!("renderer init failed (code {})", e.code());
        e.to_string()
    })?;
    let (width, height) = renderer.internal_size();
    let (out_w, out_h) = renderer.output_size();

    let (window, texture_creator) = SdlWindow::open("lumino", out_w, out_h, opts.vsync)?;
    let mut presenter = SdlPresenter::new(window, &texture_creator)?;

    // Sprites: decode failures are reported and skipped
    let mut sprites: Vec<Sprite> = opts
        .sprites
        .iter()
        .filter_map(|path| match Sprite::load(path) {
            Ok(sprite) => Some(sprite),
            Err(e) => {
                warn!("{}", e);
                None
            },
        })
        .collect();
    if sprites.is_empty() {
        sprites.extend(default_sprite(24));
    }
    for (i, sprite) in sprites.iter_mut().enumerate() {
        let x = (width as i32 / 4) * (i as i32 % 3 + 1) - sprite.width() as i32 / 2;
        let y = height as i32 / 2 - sprite.height() as i32 / 2;
        sprite.x = x;
        sprite.y = y;
        sprite.z = 1.0;
    }

    // Palette: grid colors first, then whatever the sprites use
    let palette = renderer.palette_mut();
    let grid = palette.add_color(Color::rgb(20, 24, 40)).unwrap_or(0);
    let accent = palette.add_color(Color::rgb(60, 70, 120)).unwrap_or(0);
    for sprite in &sprites {
        let added = palette.learn_colors(sprite.pixels().iter().copied().filter(|c| !c.is_transparent()));
        info!("sprite {}x{}: {} new palette colors", sprite.width(), sprite.height(), added);
    }
    let stamps: Vec<Vec<u8>> = sprites.iter().map(|s| s.to_indices(renderer.palette())).collect();

    let mut light = Light::new(0.0, 0.0, 8.0, Color::rgb(255, 220, 160), 1.2, width.min(height) as f32 * 0.6);

    info!(
        "{}x{} internal, x{} upscale, {} kernels, {} palette colors",
        width,
        height,
        renderer.upscale_factor().factor(),
        renderer.backend_name(),
        renderer.palette().len()
    );
    info!("light range {:.0} px", light.range());
    info!("Escape or close the window to quit");

    let start = Instant::now();
    let mut last_report = Instant::now();
    let mut frames = 0u32;

    loop {
        let t = start.elapsed().as_secs_f32();
        light.set_position(
            width as f32 / 2.0 + t.cos() * width as f32 * 0.35,
            height as f32 / 2.0 + (t * 1.3).sin() * height as f32 * 0.35,
        );

        renderer.clear();
        if let Some(indices) = renderer.indices() {
            for x in (0..width as i32).step_by(10) {
                indices.draw_line(x, 0, x, height as i32 - 1, grid);
            }
            for y in (0..height as i32).step_by(10) {
                indices.draw_line(0, y, width as i32 - 1, y, grid);
            }
            indices.draw_rect(2, 2, width as i32 - 4, height as i32 - 4, accent);
            // Flat, unlit copies along the bottom edge
            for (sprite, stamp) in sprites.iter().zip(&stamps) {
                indices.blit_indices(stamp, sprite.width(), sprite.x, height as i32 - sprite.height() as i32 - 4);
            }
        }

        let fb = renderer.framebuffer();
        for sprite in &sprites {
            fb.draw_lit(sprite, &light, 0.25);
        }
        fb.fill_rect_blend(light.x as i32 - 2, light.y as i32 - 2, 5, 5, Color::rgba(255, 240, 200, 160));
        fb.draw_line_blend(0, height as i32 - 1, light.x as i32, light.y as i32, Color::rgba(255, 255, 255, 48));

        if !renderer.present(&mut presenter)? {
            break;
        }

        frames += 1;
        let elapsed = last_report.elapsed().as_secs_f32();
        if elapsed >= 5.0 {
            info!("{:.1} fps", frames as f32 / elapsed);
            frames = 0;
            last_report = Instant::now();
        }
    }

    Ok(())
}

use super::{PixelBuffer, Presenter};
use log::{debug, info};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;

/// SDL window, canvas and event pump
pub struct SdlWindow {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    width: u32,
    height: u32,
}

impl SdlWindow {
    /// Open a centered window sized to the output frame.
    /// vsync=true: locked to monitor refresh
    pub fn open(
        title: &str,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<(Self, TextureCreator<WindowContext>), String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder.build().map_err(|e| e.to_string())?;

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump()?;
        info!("window {}x{} (vsync {})", width, height, vsync);

        Ok((
            Self {
                canvas,
                event_pump,
                width,
                height,
            },
            texture_creator,
        ))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Presents frames through a streaming RGBA8888 texture.
///
/// RGBA8888 is a packed format, so the buffer's native-endian `0xRRGGBBAA`
/// words upload as-is.
pub struct SdlPresenter<'a> {
    window: SdlWindow,
    texture: Texture<'a>,
}

impl<'a> SdlPresenter<'a> {
    pub fn new(
        window: SdlWindow,
        texture_creator: &'a TextureCreator<WindowContext>,
    ) -> Result<Self, String> {
        let texture = texture_creator
            .create_texture_streaming(PixelFormatEnum::RGBA8888, window.width, window.height)
            .map_err(|e| e.to_string())?;
        Ok(Self { window, texture })
    }
}

impl Presenter for SdlPresenter<'_> {
    fn present(&mut self, frame: &PixelBuffer) -> Result<(), String> {
        if frame.width() != self.window.width || frame.height() != self.window.height {
            return Err(format!(
                "frame is {}x{}, window expects {}x{}",
                frame.width(),
                frame.height(),
                self.window.width,
                self.window.height
            ));
        }
        self.texture
            .update(None, frame.as_bytes(), (frame.width() * 4) as usize)
            .map_err(|e| e.to_string())?;

        self.window.canvas.copy(&self.texture, None, None)?;
        self.window.canvas.present();
        Ok(())
    }

    fn should_run(&mut self) -> bool {
        let mut running = true;
        for event in self.window.event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => {
                    debug!("quit requested");
                    running = false;
                },
                _ => {},
            }
        }
        running
    }
}

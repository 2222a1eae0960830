use anyhow::{Context, Result};
use sdl2::pixels::PixelFormatEnum;

use chip8_vm::FrameBuffer;

/// # Display
/// A window showing the 64x32 frame buffer, each pixel scaled to a `scale` sided square.
pub struct Display {
    canvas: sdl2::render::WindowCanvas,
}

impl Display {
    /// Creates a new window bound to an sdl2 context.
    ///
    /// # Arguments
    /// * `sdl` an sdl2 context with which to draw
    /// * `title` the window title
    /// * `scale` the size multiplier for each pixel
    pub fn new(sdl: &sdl2::Sdl, title: &str, scale: u32) -> Result<Self> {
        let (width, height) = window_size(scale).context("window scale is too large")?;
        let video_subsystem = sdl.video().map_err(anyhow::Error::msg)?;
        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .build()
            .context("unable to open a window")?;
        let canvas = window
            .into_canvas()
            .build()
            .context("unable to create a canvas")?;

        Ok(Display { canvas })
    }

    /// Formats a frame buffer as the bytes of an RGB24 texture.
    ///
    /// Rows are concatenated and each pixel becomes three identical bytes,
    /// 0xFF for a lit pixel and 0x00 for a dark one.
    fn frame_to_sdl_texture(frame: &FrameBuffer) -> Vec<u8> {
        frame
            .rows()
            .iter()
            .flatten()
            .flat_map(|lit| [u8::from(*lit) * 0xFF; 3])
            .collect()
    }

    /// Uploads the frame buffer as a texture and presents it.
    pub fn draw(&mut self, frame: &FrameBuffer) -> Result<()> {
        let texture_creator = self.canvas.texture_creator();
        let mut texture = texture_creator
            .create_texture_streaming(
                PixelFormatEnum::RGB24,
                FrameBuffer::WIDTH as u32,
                FrameBuffer::HEIGHT as u32,
            )
            .context("unable to create a texture")?;

        let pixels = Display::frame_to_sdl_texture(frame);
        texture
            .update(None, &pixels, FrameBuffer::WIDTH * 3)
            .context("unable to update the texture")?;

        self.canvas
            .copy(&texture, None, None)
            .map_err(anyhow::Error::msg)?;
        self.canvas.present();
        Ok(())
    }
}

/// Window dimensions in pixels, or `None` if they don't fit in a `u32`.
fn window_size(scale: u32) -> Option<(u32, u32)> {
    Some((
        (FrameBuffer::WIDTH as u32).checked_mul(scale)?,
        (FrameBuffer::HEIGHT as u32).checked_mul(scale)?,
    ))
}

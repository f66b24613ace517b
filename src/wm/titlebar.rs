//! Titlebar Module
//!
//! The title strip at the top of a frame: lazy creation, rendering of the
//! window name and the close/shade/resize regions, and hit-testing for
//! button presses.

use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::config::Config;
use crate::wm::client::Client;
use crate::wm::client_flags::ClientOptions;
use crate::wm::screen::ScreenInfo;

/// What a press inside the frame decoration means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleAction {
    Close,
    Shade,
    Resize,
    Move,
}

/// Resolve a press at frame-relative (x, y) against the title strip layout:
/// leftmost square closes, rightmost square resizes, the square next to it
/// shades, anywhere else drags. Width is the frame width, `size` the title
/// height (also the button square side).
pub fn hit_test(x: i16, y: i16, width: u16, size: u16) -> TitleAction {
    let x = x as i32;
    let y = y as i32;
    let width = width as i32;
    let size = size as i32;
    if x > width - size {
        TitleAction::Resize
    } else if y >= size {
        TitleAction::Move
    } else if x < size {
        TitleAction::Close
    } else if x > width - 2 * size {
        TitleAction::Shade
    } else {
        TitleAction::Move
    }
}

/// Create the title strip if missing and redraw it for the current geometry.
pub fn update<C: Connection>(
    conn: &C,
    config: &Config,
    screen: &ScreenInfo,
    client: &mut Client,
) -> Result<()> {
    let Some(frame) = client.frame else {
        return Ok(());
    };
    let width = client.geometry.width as u16;
    let height = config.title_height;

    let titlebar = match client.titlebar {
        Some(t) => {
            conn.configure_window(
                t,
                &ConfigureWindowAux::new().width(width as u32).height(height as u32),
            )?;
            t
        }
        None => {
            let t = conn.generate_id()?;
            conn.create_window(
                x11rb::COPY_DEPTH_FROM_PARENT,
                t,
                frame,
                0,
                0,
                width,
                height,
                0,
                WindowClass::INPUT_OUTPUT,
                x11rb::COPY_FROM_PARENT,
                &CreateWindowAux::new()
                    .background_pixel(screen.bg)
                    .event_mask(EventMask::BUTTON_PRESS | EventMask::EXPOSURE),
            )?;
            conn.map_window(t)?;
            client.titlebar = Some(t);
            t
        }
    };

    draw(conn, screen, client, titlebar, width, height)
}

fn draw<C: Connection>(
    conn: &C,
    screen: &ScreenInfo,
    client: &Client,
    titlebar: Window,
    width: u16,
    height: u16,
) -> Result<()> {
    conn.clear_area(false, titlebar, 0, 0, width, height)?;

    let size = height;
    let mut buttons = vec![];
    if !client.options.contains(ClientOptions::NO_CLOSE) {
        buttons.push(Rectangle {
            x: 0,
            y: 0,
            width: size,
            height: size,
        });
    }
    buttons.push(Rectangle {
        x: (width.saturating_sub(2 * size)) as i16,
        y: 0,
        width: size,
        height: size,
    });
    if !client.options.contains(ClientOptions::NO_RESIZE) {
        buttons.push(Rectangle {
            x: (width.saturating_sub(size)) as i16,
            y: 0,
            width: size,
            height: size,
        });
    }
    conn.poly_fill_rectangle(titlebar, screen.title_gc, &buttons)?;

    let name = window_name(conn, client.window)?;
    if !name.is_empty() {
        let text: Vec<u8> = name.bytes().take(128).collect();
        conn.image_text8(
            titlebar,
            screen.title_gc,
            size as i16 + 4,
            height as i16 - 4,
            &text,
        )?;
    }
    Ok(())
}

fn window_name<C: Connection>(conn: &C, window: Window) -> Result<String> {
    let reply = conn
        .get_property(false, window, AtomEnum::WM_NAME, AtomEnum::ANY, 0, 256)?
        .reply();
    match reply {
        Ok(r) => Ok(String::from_utf8_lossy(&r.value).into_owned()),
        Err(_) => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: u16 = 200;
    const SIZE: u16 = 18;

    #[test]
    fn leftmost_square_closes() {
        assert_eq!(hit_test(3, 5, WIDTH, SIZE), TitleAction::Close);
    }

    #[test]
    fn rightmost_square_resizes() {
        assert_eq!(hit_test(195, 5, WIDTH, SIZE), TitleAction::Resize);
    }

    #[test]
    fn second_from_right_shades() {
        assert_eq!(hit_test(170, 5, WIDTH, SIZE), TitleAction::Shade);
    }

    #[test]
    fn middle_of_strip_moves() {
        assert_eq!(hit_test(90, 5, WIDTH, SIZE), TitleAction::Move);
    }

    #[test]
    fn press_below_strip_moves_except_right_edge() {
        assert_eq!(hit_test(3, 50, WIDTH, SIZE), TitleAction::Move);
        assert_eq!(hit_test(195, 50, WIDTH, SIZE), TitleAction::Resize);
    }
}

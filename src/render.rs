//! Overlay drawing for analysed frames.
//!
//! [`annotate`] is a pure function of a frame and its metrics. It never
//! touches analyzer state, so display code can call it as often as it likes.

use crate::core::{EyeContact, FrameMetrics};
use image::{Rgb, RgbImage};

const BAND: [u8; 3] = [24, 24, 24];
const GREEN: [u8; 3] = [0, 200, 0];
const YELLOW: [u8; 3] = [230, 200, 0];
const RED: [u8; 3] = [220, 0, 0];
const GRAY: [u8; 3] = [128, 128, 128];
const WHITE: [u8; 3] = [255, 255, 255];

/// Colour for a confidence score: green from 70, yellow from 40, red below.
pub fn score_color(score: u8) -> [u8; 3] {
    match score {
        70..=u8::MAX => GREEN,
        40..=69 => YELLOW,
        _ => RED,
    }
}

/// Copy `image` and draw the metrics overlay onto the copy.
///
/// Layout: a dark header band across the top with three status squares
/// (presence, eye contact, posture) at its left followed by one narrow tick
/// per displayed feedback line (at most `feedback_limit`). The score sits in
/// digits at the right of the band and a confidence bar runs along its bottom
/// edge with a length proportional to the score.
pub fn annotate(image: &RgbImage, metrics: &FrameMetrics, feedback_limit: usize) -> RgbImage {
    let mut out = image.clone();
    let (w, h) = out.dimensions();
    if w == 0 || h == 0 {
        return out;
    }

    let band_h = (h / 6).clamp(1, 48);
    fill_rect(&mut out, 0, 0, w, band_h, BAND);

    let bar_h = (band_h / 4).max(1);
    let bar_w = (u64::from(w) * u64::from(metrics.confidence_score.min(100)) / 100) as u32;
    fill_rect(
        &mut out,
        0,
        band_h - bar_h,
        bar_w,
        bar_h,
        score_color(metrics.confidence_score),
    );

    let side = (band_h / 2).max(1);
    let gap = (side / 2).max(1);
    let top = band_h / 8;
    for (i, color) in status_colors(metrics).into_iter().enumerate() {
        let x = gap + i as u32 * (side + gap);
        fill_rect(&mut out, x, top, side, side, color);
    }

    let scale = (band_h / 12).max(1);
    let text = metrics.confidence_score.to_string();
    let text_w = text.len() as u32 * 4 * scale;
    let text_x = w.saturating_sub(gap + text_w);
    if w > text_w + gap {
        draw_digits(&mut out, text_x, top, &text, scale, WHITE);
    }

    // Feedback ticks stop short of the score digits
    let tick_w = (side / 2).max(1);
    let ticks_x = gap + 3 * (side + gap);
    for i in 0..metrics.display_feedback(feedback_limit).len() as u32 {
        let x = ticks_x + i * (tick_w + gap);
        if x + tick_w + gap > text_x {
            break;
        }
        fill_rect(&mut out, x, top, tick_w, side, WHITE);
    }

    out
}

fn status_colors(metrics: &FrameMetrics) -> [[u8; 3]; 3] {
    let presence = if metrics.presence { GREEN } else { RED };
    let eye = match metrics.eye_contact {
        EyeContact::Good => GREEN,
        EyeContact::Moderate => YELLOW,
        EyeContact::Away => RED,
        EyeContact::Unknown => GRAY,
    };
    let posture = if metrics.posture.is_good { GREEN } else { RED };
    [presence, eye, posture]
}

/// Fill a rectangle, clipped to the image.
fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
    let x_end = x.saturating_add(w).min(img.width());
    let y_end = y.saturating_add(h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, Rgb(color));
        }
    }
}

/// 3x5 bitmap glyphs for the score digits.
fn glyph(ch: char) -> [u8; 5] {
    match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        _ => [0; 5],
    }
}

fn draw_digits(img: &mut RgbImage, x: u32, y: u32, text: &str, scale: u32, color: [u8; 3]) {
    let mut cursor = x;
    for ch in text.chars() {
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..3u32 {
                if (bits >> (2 - col)) & 1 == 1 {
                    fill_rect(
                        img,
                        cursor + col * scale,
                        y + row as u32 * scale,
                        scale,
                        scale,
                        color,
                    );
                }
            }
        }
        cursor += 4 * scale;
    }
}

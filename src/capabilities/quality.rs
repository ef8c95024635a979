use image::DynamicImage;

const ANALYSIS_SIZE: u32 = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    pub brightness: f64,
    pub clarity: f64,
    pub color_balance: f64,
    pub summary: String,
}

/// Photo quality metrics, all in `[0, 1]`.
///
/// brightness is mean luma, clarity is the variance of the Laplacian
/// (scaled so 1000 and above count as fully sharp) and color_balance is one
/// minus the spread between the brightest and darkest channel means.
#[derive(Debug, Default, Clone, Copy)]
pub struct QualityAnalyzer;

impl QualityAnalyzer {
    pub fn analyze(&self, image: &DynamicImage) -> QualityReport {
        let thumb = if image.width() > ANALYSIS_SIZE || image.height() > ANALYSIS_SIZE {
            image.thumbnail(ANALYSIS_SIZE, ANALYSIS_SIZE)
        } else {
            image.clone()
        };
        let gray = thumb.to_luma8();
        let rgb = thumb.to_rgb8();

        let pixels = f64::from(gray.width() * gray.height()).max(1.0);
        let brightness = gray.pixels().map(|p| f64::from(p.0[0])).sum::<f64>() / pixels / 255.0;

        let clarity = (laplacian_variance(&gray) / 1000.0).clamp(0.0, 1.0);

        let mut sums = [0f64; 3];
        for p in rgb.pixels() {
            for (sum, channel) in sums.iter_mut().zip(p.0) {
                *sum += f64::from(channel);
            }
        }
        let means = sums.map(|s| s / pixels);
        let spread = means.iter().cloned().fold(f64::MIN, f64::max)
            - means.iter().cloned().fold(f64::MAX, f64::min);
        let color_balance = (1.0 - spread / 255.0).clamp(0.0, 1.0);

        QualityReport {
            brightness,
            clarity,
            color_balance,
            summary: summarize(brightness, clarity, color_balance),
        }
    }
}

fn laplacian_variance(gray: &image::GrayImage) -> f64 {
    let (w, h) = gray.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }
    let at = |x: u32, y: u32| f64::from(gray.get_pixel(x, y).0[0]);

    let mut values = Vec::with_capacity(((w - 2) * (h - 2)) as usize);
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            values.push(4.0 * at(x, y) - at(x - 1, y) - at(x + 1, y) - at(x, y - 1) - at(x, y + 1));
        }
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

fn summarize(brightness: f64, clarity: f64, color_balance: f64) -> String {
    let mut parts = Vec::new();

    parts.push(if brightness < 0.25 {
        "The photo is quite dark; better lighting would help spot skin and coat issues."
    } else if brightness > 0.85 {
        "The photo is overexposed, which can wash out coat and eye details."
    } else {
        "Lighting looks good."
    });

    parts.push(if clarity < 0.1 {
        "The image is blurry, so coat and eye condition are hard to assess."
    } else if clarity < 0.3 {
        "Image sharpness is acceptable."
    } else {
        "The image is sharp enough to assess coat and eye condition."
    });

    if color_balance < 0.8 {
        parts.push("Colors look skewed, which can hide redness or discoloration.");
    }

    parts.join(" ")
}

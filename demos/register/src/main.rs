use argh::FromArgs;
use std::path::{Path, PathBuf};

use imreg::features::{load_features_json, PrecomputedSource};
use imreg::image::{Image, ImageSize};
use imreg::{register_images, RegistrationConfig, RegistrationResult};

#[derive(FromArgs)]
/// Align image A onto image B from precomputed keypoints and descriptors
struct Args {
    /// path to the image to align
    #[argh(positional)]
    image_a: PathBuf,

    /// path to the reference image
    #[argh(positional)]
    image_b: PathBuf,

    /// JSON file with the features of image A
    #[argh(option)]
    features_a: PathBuf,

    /// JSON file with the features of image B
    #[argh(option)]
    features_b: PathBuf,

    /// JSON registration config
    #[argh(option)]
    config: Option<PathBuf>,

    /// override the ratio test threshold
    #[argh(option)]
    ratio: Option<f32>,

    /// override the RANSAC reprojection threshold in pixels
    #[argh(option)]
    threshold: Option<f64>,

    /// override the RANSAC seed
    #[argh(option)]
    seed: Option<u64>,

    /// where to write image A warped onto image B
    #[argh(option, default = "PathBuf::from(\"aligned.png\")")]
    output: PathBuf,

    /// where to write the 50/50 blend of the aligned image and image B
    #[argh(option)]
    overlay: Option<PathBuf>,
}

fn read_rgb(path: &Path) -> Result<Image<f32, 3>, Box<dyn std::error::Error>> {
    let rgb = image::open(path)?.to_rgb8();
    let size = ImageSize {
        width: rgb.width() as usize,
        height: rgb.height() as usize,
    };
    let image = Image::<u8, 3>::new(size, rgb.into_raw())?;
    Ok(image.cast_and_scale(1.0 / 255.0)?)
}

fn write_rgb(path: &Path, image: &Image<f32, 3>) -> Result<(), Box<dyn std::error::Error>> {
    let data = image
        .as_slice()
        .iter()
        .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect::<Vec<_>>();
    let [width, height]: [u32; 2] = image.size().into();
    let buffer = image::RgbImage::from_raw(width, height, data)
        .ok_or("image buffer does not match its size")?;
    buffer.save(path)?;
    Ok(())
}

fn blend(
    a: &Image<f32, 3>,
    b: &Image<f32, 3>,
) -> Result<Image<f32, 3>, Box<dyn std::error::Error>> {
    let data = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(&x, &y)| 0.5 * x + 0.5 * y)
        .collect();
    Ok(Image::new(b.size(), data)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => RegistrationConfig::from_json_file(path)?,
        None => RegistrationConfig::default(),
    };
    if let Some(ratio) = args.ratio {
        config.matcher.ratio = ratio;
    }
    if let Some(threshold) = args.threshold {
        config.ransac.threshold = threshold;
    }
    if let Some(seed) = args.seed {
        config.ransac.random_seed = Some(seed);
    }

    let image_a = read_rgb(&args.image_a)?;
    let image_b = read_rgb(&args.image_b)?;
    log::info!("image A: {}, image B: {}", image_a.size(), image_b.size());

    let source = PrecomputedSource::from_pair(
        load_features_json(&args.features_a)?,
        load_features_json(&args.features_b)?,
    );

    match register_images(&image_a, &image_b, &source, &config)? {
        RegistrationResult::Aligned {
            homography,
            inlier_mask,
            warped_image,
            ..
        } => {
            let inliers = inlier_mask.iter().filter(|&&b| b).count();
            println!("homography:");
            for row in homography.as_array() {
                println!("  [{:12.6}, {:12.6}, {:12.6}]", row[0], row[1], row[2]);
            }
            println!("inliers: {inliers} / {}", inlier_mask.len());

            write_rgb(&args.output, &warped_image)?;
            log::info!("wrote {}", args.output.display());

            if let Some(path) = &args.overlay {
                write_rgb(path, &blend(&warped_image, &image_b)?)?;
                log::info!("wrote {}", path.display());
            }
        }
        RegistrationResult::Failed { reason } => {
            println!("registration failed: {reason}");
        }
    }

    Ok(())
}

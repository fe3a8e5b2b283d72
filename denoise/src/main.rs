//! Haar wavelet shrinkage demo.
//!
//! Decomposes a set of PGM images for display, denoises a noisy image by
//! wavelet shrinkage and reports the PSNR between the original, noisy and
//! denoised images.

use std::error;
use std::path::{Path, PathBuf};
use std::process;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use log::info;

use pyramid::pgm::{load_pgm, save_pgm};
use pyramid::{psnr, BorderStyle, Denoiser, HaarPyramid, Plane, Shrinkage};

#[derive(Debug, Parser)]
#[command(version, about = "Haar wavelet pyramid decomposition and shrinkage denoising")]
struct Options {
    /// Shrinkage threshold
    #[arg(default_value_t = 30)]
    threshold: u32,

    /// Use soft shrinkage (1/true) or hard shrinkage (0/false)
    #[arg(
        default_value = "true",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    soft: bool,

    /// Noise free reference image
    #[arg(long, default_value = "Barbara.pgm")]
    original: PathBuf,

    /// Noisy image to denoise
    #[arg(long, default_value = "BarbaraNoisy.pgm")]
    noisy: PathBuf,

    /// Additional images to decompose for display
    #[arg(
        long = "decompose",
        value_name = "PATH",
        num_args = 0..,
        default_value = "birds.pgm"
    )]
    extra: Vec<PathBuf>,

    /// Number of decomposition levels
    #[arg(long, default_value_t = 3)]
    levels: usize,

    /// Directory receiving the output images
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

impl Options {
    fn mode(&self) -> Shrinkage {
        if self.soft {
            Shrinkage::Soft
        } else {
            Shrinkage::Hard
        }
    }

    /// Output path `<output_dir>/<stem><suffix>.pgm` for an input image
    fn output_path(&self, input: &Path, suffix: &str) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("image"));
        self.output_dir.join(format!("{}{}.pgm", stem, suffix))
    }
}

/// Decompose an image with framed bands, for viewing
fn decompose_for_display(
    pyramid: &HaarPyramid,
    image: &Plane,
) -> Result<Plane, Box<dyn error::Error>> {
    let mut result = Plane::filled(image.width(), image.height(), 255.0);
    pyramid.decompose_for_display(image, &mut result, BorderStyle::default())?;
    Ok(result)
}

fn run(options: &Options) -> Result<(), Box<dyn error::Error>> {
    let original = load_pgm(&options.original)?;
    let noisy = load_pgm(&options.noisy)?;
    let extra = options
        .extra
        .iter()
        .map(|path| Ok((path, load_pgm(path)?)))
        .collect::<Result<Vec<_>, Box<dyn error::Error>>>()?;

    let pyramid = HaarPyramid::new(options.levels);
    let mut decompositions = vec![
        (&options.original, decompose_for_display(&pyramid, &original)?),
        (&options.noisy, decompose_for_display(&pyramid, &noisy)?),
    ];
    for (path, image) in extra.iter() {
        decompositions.push((*path, decompose_for_display(&pyramid, image)?));
    }

    let denoiser = Denoiser::new(options.threshold as f64, options.mode(), options.levels)?;
    let mut denoised = Plane::new(noisy.width(), noisy.height());
    denoiser.denoise(&noisy, &mut denoised)?;
    denoised.normalize(0.0, 255.0);

    println!("PSNR original -- noise:");
    println!("{}", psnr(&original, &noisy)?);
    println!("PSNR noise -- wavelet shrinkage:");
    println!("{}", psnr(&noisy, &denoised)?);
    println!("PSNR original -- wavelet shrinkage:");
    println!("{}", psnr(&original, &denoised)?);
    println!();
    println!(
        "wavelet shrinkage: {}",
        match denoiser.mode() {
            Shrinkage::Soft => "soft",
            Shrinkage::Hard => "hard",
        }
    );
    println!("threshold: {}", options.threshold);

    for (path, decomposition) in decompositions.iter() {
        save_pgm(decomposition, options.output_path(path, "Decomp"))?;
    }
    save_pgm(&denoised, options.output_path(&options.noisy, "WS"))?;

    info!("done");
    Ok(())
}

fn main() {
    env_logger::init();

    let options = Options::parse();
    info!("{:?}", options);

    if let Err(e) = run(&options) {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

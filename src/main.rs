use args::{guess_colorspace, guess_size, show_size, Args};
use clap::Parser;
use shveu::{
    memory_pool, uiomux::PhysAddr, Config, Device, ImageDescriptor, PixelFormat, TransformRequest,
};
use std::{
    error::Error,
    fs::{self, File},
    io::{self, Read, Write},
    process,
};
use tracing::{debug, error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

mod args;

const BUFFER_ALIGN: usize = 32;

/// Resolved geometry of one conversion run.
#[derive(Debug, Clone, Copy)]
struct Plan {
    input_format: PixelFormat,
    input_size: (u32, u32),
    output_format: PixelFormat,
    output_size: (u32, u32),
    rotate: bool,
}

impl Plan {
    fn resolve(args: &Args, output: &str) -> Result<Self, String> {
        let input_format = args
            .input_colorspace
            .or_else(|| guess_colorspace(&args.input))
            .ok_or("input colorspace not specified and cannot be guessed")?;

        let input_size = match args.input_size {
            Some(size) => size,
            None => {
                let len = if args.input == "-" {
                    0
                } else {
                    fs::metadata(&args.input).map(|m| m.len()).unwrap_or(0)
                };
                guess_size(len, input_format, args.input_width, args.input_height)
                    .ok_or("input size not specified and cannot be guessed")?
            }
        };

        let output_format = args
            .output_colorspace
            .or_else(|| guess_colorspace(output))
            .unwrap_or(input_format);

        let output_size = args.output_size.unwrap_or(if args.rotate {
            (input_size.1, input_size.0)
        } else {
            input_size
        });

        Ok(Self {
            input_format,
            input_size,
            output_format,
            output_size,
            rotate: args.rotate,
        })
    }

    fn input_frame(&self) -> usize {
        self.input_format
            .frame_size(self.input_size.0, self.input_size.1)
    }

    fn output_frame(&self) -> usize {
        self.output_format
            .frame_size(self.output_size.0, self.output_size.1)
    }
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(level);

    let journald = if args.journald {
        match tracing_journald::layer() {
            Ok(layer) => Some(layer.with_filter(level)),
            Err(e) => {
                eprintln!("journald unavailable: {e}");
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(stderr)
        .with(journald)
        .init();
}

fn descriptor(
    buf_phys: PhysAddr,
    format: PixelFormat,
    size: (u32, u32),
) -> ImageDescriptor<PhysAddr> {
    let (width, height) = size;
    let pc = if format.is_rgb() {
        PhysAddr(0)
    } else {
        buf_phys.offset(width * height)
    };
    ImageDescriptor::new(buf_phys, pc, width, height, format)
}

/// Reads until `buf` is full or the input ends, returning the bytes read.
fn read_frame(input: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args);

    let Some(output_path) = args.output_path().map(str::to_owned) else {
        error!("no output file specified");
        process::exit(2);
    };

    let plan = match Plan::resolve(&args, &output_path) {
        Ok(plan) => plan,
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    };

    info!(
        "input:  {} {}x{} {}",
        args.input,
        plan.input_size.0,
        plan.input_size.1,
        show_size(plan.input_size.0, plan.input_size.1)
    );
    info!("        {}", plan.input_format);
    info!(
        "output: {} {}x{} {}",
        output_path,
        plan.output_size.0,
        plan.output_size.1,
        show_size(plan.output_size.0, plan.output_size.1)
    );
    info!("        {}", plan.output_format);
    if plan.rotate {
        info!("rotation: 90 degrees");
    }

    let config = Config {
        device_name: args.device.clone(),
        use_interrupt: !args.poll,
        ..Config::default()
    };

    let mut pool = memory_pool(&config)?;
    let src = pool.alloc(plan.input_frame(), BUFFER_ALIGN)?;
    let dst = pool.alloc(plan.output_frame(), BUFFER_ALIGN)?;
    debug!("source buffer {} destination buffer {}", src.phys, dst.phys);

    let mut device = Device::open_with(&config)?;
    info!("using {}", device.generation());

    let source = descriptor(src.phys, plan.input_format, plan.input_size);
    let destination = descriptor(dst.phys, plan.output_format, plan.output_size);
    let request = if plan.rotate {
        TransformRequest::rotated(source, destination)
    } else {
        TransformRequest::new(source, destination)
    };

    let mut input: Box<dyn Read> = if args.input == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(&args.input)?)
    };
    let mut output: Box<dyn Write> = if output_path == "-" {
        Box::new(io::stdout().lock())
    } else {
        Box::new(File::create(&output_path)?)
    };

    let mut frames = 0u64;
    loop {
        let read = read_frame(&mut input, pool.slice_mut(&src))?;
        if read == 0 {
            break;
        }
        if read < src.len {
            warn!("short read: {} of {} bytes, frame dropped", read, src.len);
            break;
        }

        device.transform(&request)?;
        output.write_all(pool.slice(&dst))?;
        frames += 1;
    }

    output.flush()?;
    device.close()?;
    info!("frames: {}", frames);
    Ok(())
}

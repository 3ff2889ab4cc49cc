mod adpcm;
mod bytes_ext;
mod clip;
mod error;
mod frame;
mod header;
mod pal;
mod sector;
mod sprite;
mod tile;

use std::{
    fs::{self, File},
    io::{BufReader, Seek, SeekFrom, Write},
    path::PathBuf,
};

use clap::Parser;
use log::{info, warn};

use crate::{
    clip::{decode_clip, scan_clips, ClipSink, ClipSummary, DecodeOptions, Game},
    error::Error,
    frame::Frame,
    header::HeaderLayout,
};

#[derive(Debug, Parser)]
#[command(name = "huvideo-extract", about = "Extracts HuVideo clips to PNG frames")]
struct Cli {
    /// Clip offset in hex; scans the whole input when omitted
    #[arg(short, long, value_parser = parse_hex)]
    offset: Option<u64>,
    /// 0 = Power Golf 2, 1 = Beyond Shadowgate
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    game: u8,
    /// Header trailer layout, defaults to the game's
    #[arg(long, value_enum)]
    layout: Option<HeaderLayout>,
    /// Reject headers whose frames run past the end of the input
    #[arg(long)]
    strict: bool,
    /// Do not write ADPCM payloads
    #[arg(long)]
    no_audio: bool,
    input: PathBuf,
    /// Output prefix, or output directory when scanning
    output: PathBuf,
}

fn parse_hex(s: &str) -> Result<u64, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid hex offset `{}`: {}", s, e))
}

/// Writes frames and audio next to a prefix or inside a directory.
enum PngSink {
    Prefix(String),
    Directory(PathBuf),
}

impl PngSink {
    fn frame_path(&self, clip_offset: u64, index: u16) -> PathBuf {
        match self {
            PngSink::Prefix(prefix) => format!("{}{:06}.png", prefix, index).into(),
            PngSink::Directory(dir) => dir.join(format!("{:08x}_{:06}.png", clip_offset, index)),
        }
    }

    fn audio_path(&self, clip_offset: u64) -> PathBuf {
        match self {
            PngSink::Prefix(prefix) => format!("{}.adpcm", prefix).into(),
            PngSink::Directory(dir) => dir.join(format!("{:08x}.adpcm", clip_offset)),
        }
    }
}

impl ClipSink for PngSink {
    fn frame(&mut self, clip_offset: u64, index: u16, frame: &Frame) -> Result<(), Error> {
        frame.write_png(&self.frame_path(clip_offset, index))
    }

    fn audio(&mut self, clip_offset: u64, data: &[u8]) -> Result<(), Error> {
        let path = self.audio_path(clip_offset);
        let mut f = File::create(&path)?;
        f.write_all(data)?;
        info!("Extracted {} audio bytes to `{}`", data.len(), path.display());
        Ok(())
    }
}

fn report(clip: &ClipSummary) {
    info!(
        "clip at {:#x}: {} {}x{} frames ({:?}), {} audio bytes",
        clip.offset,
        clip.frames_decoded,
        clip.header.width,
        clip.header.height,
        clip.format,
        clip.audio_bytes.unwrap_or(0)
    );
    if clip.frames_degraded > 0 {
        warn!(
            "clip at {:#x}: input ended early, {} frames were zero-filled",
            clip.offset, clip.frames_degraded
        );
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let game = Game::from_id(cli.game).unwrap_or(Game::PowerGolf2);
    let mut opts = DecodeOptions::new(game);
    if let Some(layout) = cli.layout {
        opts.header_layout = layout;
    }
    opts.strict = cli.strict;
    opts.extract_audio = !cli.no_audio;

    let file = File::open(&cli.input)?;
    let mut reader = BufReader::new(file);
    let stream_len = reader.seek(SeekFrom::End(0))?;

    match cli.offset {
        Some(offset) => {
            let mut sink = PngSink::Prefix(cli.output.to_string_lossy().into_owned());
            let clip = decode_clip(&mut reader, offset, stream_len, &opts, &mut sink)?;
            report(&clip);
        }
        None => {
            fs::create_dir_all(&cli.output)?;
            let mut sink = PngSink::Directory(cli.output.clone());
            let clips = scan_clips(&mut reader, stream_len, &opts, &mut sink)?;
            for clip in &clips {
                report(clip);
            }
            info!("Found {} clips in `{}`", clips.len(), cli.input.display());
        }
    }

    Ok(())
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::{ffi::OsStr, path::Path};

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_offsets_and_games() {
        let cli = Cli::try_parse_from(["huvideo-extract", "-o", "0x24c0", "-g", "1", "in.bin", "out/"]).unwrap();
        assert_eq!(cli.offset, Some(0x24c0));
        assert_eq!(cli.game, 1);
        assert_eq!(cli.layout, None);

        let cli = Cli::try_parse_from(["huvideo-extract", "--offset", "1F", "in.bin", "out"]).unwrap();
        assert_eq!(cli.offset, Some(0x1f));
        assert_eq!(cli.game, 0);

        assert!(Cli::try_parse_from(["huvideo-extract", "-g", "2", "in.bin", "out"]).is_err());
        assert!(Cli::try_parse_from(["huvideo-extract", "-o", "zz", "in.bin", "out"]).is_err());
        assert!(Cli::try_parse_from(["huvideo-extract", "in.bin"]).is_err());
    }

    #[test]
    fn sink_naming() {
        let prefix = PngSink::Prefix("out/intro_".into());
        assert_eq!(prefix.frame_path(0x10, 7), PathBuf::from("out/intro_000007.png"));
        assert_eq!(prefix.audio_path(0x10), PathBuf::from("out/intro_.adpcm"));

        let dir = PngSink::Directory("out".into());
        assert_eq!(dir.frame_path(0x9340, 12), Path::new("out").join("00009340_000012.png"));
        assert_eq!(dir.audio_path(0x9340), Path::new("out").join("00009340.adpcm"));
    }

    #[test]
    fn extracts_pngs_from_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("track.bin");
        let output = dir.path().join("frames");

        let mut stream = vec![0u8; clip::SCAN_ORIGIN as usize];
        stream.extend_from_slice(header::MAGIC);
        for v in [1u16, 8, 8] {
            stream.extend_from_slice(&v.to_le_bytes());
        }
        stream.extend_from_slice(&[0, 0]);
        stream.resize(0x30, 0);
        // color 3 is white
        stream.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0xff, 0x01]);
        stream.resize(clip::SCAN_ORIGIN as usize + 4 * 0x930, 0);
        // planes 0 and 1 set everywhere: color 3
        stream.extend(std::iter::repeat(0xff).take(16));
        stream.resize(stream.len() + 0x930 - 16, 0);
        fs::write(&input, &stream).unwrap();

        let cli = Cli::try_parse_from([
            OsStr::new("huvideo-extract"),
            input.as_os_str(),
            output.as_os_str(),
        ])
        .unwrap();
        run(&cli).unwrap();

        let png_path = output.join("00000010_000000.png");
        let decoder = png::Decoder::new(File::open(&png_path).unwrap());
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (8, 8));
        assert!(buf[..info.buffer_size()].iter().all(|&b| b == 255));
    }
}

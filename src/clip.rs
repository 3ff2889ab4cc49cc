use std::io::{Read, Seek, SeekFrom};

use log::{debug, info, warn};

use crate::{
    adpcm::{extract_audio, AUDIO_SUBHEADER_SIZE},
    error::Error,
    frame::Frame,
    header::{parse_header, ClipHeader, Format, HeaderLayout, HEADER_SIZE},
    pal::Palette,
    sector::{demux, SectorLayout},
    sprite::draw_sprites,
    tile::draw_tiles,
};

/// Where the first scan candidate sits: the user data of a raw sector.
pub const SCAN_ORIGIN: u64 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Game {
    PowerGolf2,
    BeyondShadowgate,
}

impl Game {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Game::PowerGolf2),
            1 => Some(Game::BeyondShadowgate),
            _ => None,
        }
    }

    pub fn header_layout(self) -> HeaderLayout {
        match self {
            Game::PowerGolf2 => HeaderLayout::Opaque,
            Game::BeyondShadowgate => HeaderLayout::Audio,
        }
    }
}

/// How a clip's frames are laid out after the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    /// Whole sectors from the clip offset to the first frame.
    pub skip_sectors: u64,
    pub format: Format,
}

/// Resolves skip-sector count and effective format for a clip.
pub fn plan_frames(game: Game, header: &ClipHeader, layout: &SectorLayout) -> Result<FramePlan, Error> {
    let plan = match (game, header.width, header.height) {
        // Past the BAT-sized region; the frames are stored as-is.
        (Game::PowerGolf2, _, _) => FramePlan {
            skip_sectors: 4,
            format: header.format,
        },
        (Game::BeyondShadowgate, 256, 128) => FramePlan {
            skip_sectors: 8,
            format: header.format,
        },
        (Game::BeyondShadowgate, 128, 96) => {
            let prefix = AUDIO_SUBHEADER_SIZE + header.adpcm_len() as usize;
            FramePlan {
                skip_sectors: prefix.div_ceil(layout.payload_size) as u64 + 1,
                format: header.format,
            }
        }
        (Game::BeyondShadowgate, _, _) => {
            let skip = header.unknown().first().ok_or(Error::MissingSkipField(0))?;
            FramePlan {
                skip_sectors: *skip as u64,
                format: Format::Spr,
            }
        }
    };
    Ok(plan)
}

#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    pub game: Game,
    pub header_layout: HeaderLayout,
    pub sectors: SectorLayout,
    /// Reject headers whose frames would run past the end of the input.
    pub strict: bool,
    pub extract_audio: bool,
}

impl DecodeOptions {
    pub fn new(game: Game) -> Self {
        Self {
            game,
            header_layout: game.header_layout(),
            sectors: SectorLayout::CD_MODE1,
            strict: false,
            extract_audio: true,
        }
    }
}

/// Receives everything a clip decodes to.
pub trait ClipSink {
    fn frame(&mut self, clip_offset: u64, index: u16, frame: &Frame) -> Result<(), Error>;
    fn audio(&mut self, clip_offset: u64, data: &[u8]) -> Result<(), Error>;
}

#[derive(Debug)]
pub struct ClipSummary {
    pub offset: u64,
    pub header: ClipHeader,
    pub format: Format,
    pub frames_decoded: u16,
    pub frames_degraded: u16,
    pub audio_bytes: Option<usize>,
    /// Stream position after the last frame.
    pub end: u64,
}

/// Decodes the clip whose header sits at `offset`.
pub fn decode_clip<R: Read + Seek, S: ClipSink>(
    r: &mut R,
    offset: u64,
    stream_len: u64,
    opts: &DecodeOptions,
    sink: &mut S,
) -> Result<ClipSummary, Error> {
    r.seek(SeekFrom::Start(offset))?;
    let header = parse_header(r, opts.header_layout)?;

    r.seek(SeekFrom::Start(offset + HEADER_SIZE))?;
    let pal = Palette::read_from(r)?;
    debug!(
        "clip at {:#x}: palette flag {}, palette {:02x?}",
        offset,
        header.palette_flag,
        pal.as_slice()
    );

    let plan = plan_frames(opts.game, &header, &opts.sectors)?;
    let frame_bytes = header.frame_bytes();
    let payload_start = offset + plan.skip_sectors * opts.sectors.sector_size as u64;

    if opts.strict {
        let needed = payload_start
            + header.frame_count as u64 * opts.sectors.physical_len(frame_bytes);
        if needed > stream_len {
            return Err(Error::ImplausibleHeader {
                needed,
                available: stream_len,
            });
        }
    }

    info!(
        "clip at {:#x}: {} frames, {}x{}, {:?}, payload at {:#x}",
        offset, header.frame_count, header.width, header.height, plan.format, payload_start
    );

    let mut audio_bytes = None;
    let adpcm_len = header.adpcm_len() as usize;
    if opts.extract_audio && adpcm_len > 0 {
        match extract_audio(r, &opts.sectors, offset, adpcm_len) {
            Ok(data) => {
                sink.audio(offset, &data)?;
                audio_bytes = Some(data.len());
            }
            Err(e) => warn!("clip at {:#x}: audio not extracted: {}", offset, e),
        }
    }

    r.seek(SeekFrom::Start(payload_start))?;
    let mut vram = vec![0u8; frame_bytes];
    let mut frame = Frame::new(header.width as usize, header.height as usize);
    let mut frames_degraded = 0;

    for k in 0..header.frame_count {
        let got = demux(r, &opts.sectors, &mut vram);
        if got < frame_bytes {
            warn!("clip at {:#x}: frame {} is incomplete", offset, k);
            frames_degraded += 1;
        }

        match plan.format {
            Format::Bg => draw_tiles(&mut frame, &vram, &pal),
            Format::Spr => draw_sprites(&mut frame, &vram, &pal),
        }
        sink.frame(offset, k, &frame)?;
    }

    Ok(ClipSummary {
        offset,
        format: plan.format,
        frames_decoded: header.frame_count,
        frames_degraded,
        audio_bytes,
        end: r.stream_position()?,
        header,
    })
}

/// Looks for clips at every sector boundary and decodes each one found.
pub fn scan_clips<R: Read + Seek, S: ClipSink>(
    r: &mut R,
    stream_len: u64,
    opts: &DecodeOptions,
    sink: &mut S,
) -> Result<Vec<ClipSummary>, Error> {
    let stride = opts.sectors.sector_size as u64;
    let mut clips = Vec::new();
    let mut candidate = SCAN_ORIGIN;

    while candidate + HEADER_SIZE <= stream_len {
        match decode_clip(r, candidate, stream_len, opts, sink) {
            Ok(summary) => {
                let resume = summary.end.max(candidate + 1);
                candidate = SCAN_ORIGIN + (resume - SCAN_ORIGIN).div_ceil(stride) * stride;
                clips.push(summary);
            }
            Err(e) if e.rejects_candidate() => {
                debug!("no clip at {:#x}: {}", candidate, e);
                candidate += stride;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(clips)
}

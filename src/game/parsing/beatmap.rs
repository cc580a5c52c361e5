use crate::game::rail::LANE_COUNT;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const TEMPO_TAG: &str = "#BPMS:";
const BLOCK_END_TAG: &str = "#NOTES:";
const ROW_WIDTH: usize = 4;
const MIN_SLOTS_PER_MEASURE: usize = 4;

/// A lane index, or `None` for a slot with no note.
pub type NoteSlot = Option<usize>;

#[derive(Debug, Error)]
pub enum BeatmapError {
    #[error("could not read beatmap {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("measure {index} out of range (chart has {len})")]
    MeasureOutOfRange { index: usize, len: usize },
    #[error("slot {slot} out of range for measure {measure} ({len} slots)")]
    SlotOutOfRange { measure: usize, slot: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    SeekTempo,
    SeekBlock,
    Collecting,
    Done,
}

/// One difficulty block of a `.sm` chart reduced to lane choices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Beatmap {
    bpm: u32,
    measures: Vec<Vec<NoteSlot>>,
    max_slots_per_measure: usize,
    ignored_rows: usize,
}

impl Beatmap {
    /// Reads and parses the chart at `path`, collecting the block whose label
    /// line reads `<difficulty>:`.
    pub fn open<P: AsRef<Path>>(path: P, difficulty: &str) -> Result<Self, BeatmapError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| BeatmapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let beatmap = Self::parse(&text, difficulty);
        info!(
            "Loaded beatmap {:?} [{}]: {} BPM, {} measures, {} rows ignored.",
            path,
            difficulty,
            beatmap.bpm,
            beatmap.measures.len(),
            beatmap.ignored_rows
        );
        Ok(beatmap)
    }

    pub fn parse(text: &str, difficulty: &str) -> Self {
        let mut beatmap = Beatmap {
            max_slots_per_measure: MIN_SLOTS_PER_MEASURE,
            ..Default::default()
        };
        let mut stage = Stage::SeekTempo;
        let mut current: Vec<NoteSlot> = Vec::new();

        for raw_line in text.lines() {
            let line = strip_comment(raw_line).trim();

            match stage {
                Stage::SeekTempo => {
                    if let Some(idx) = line.find(TEMPO_TAG) {
                        beatmap.bpm = parse_tempo(&line[idx + TEMPO_TAG.len()..]);
                        stage = Stage::SeekBlock;
                    }
                }
                Stage::SeekBlock => {
                    if is_block_label(line, difficulty) {
                        stage = Stage::Collecting;
                    }
                }
                Stage::Collecting => {
                    if line.contains(BLOCK_END_TAG) {
                        stage = Stage::Done;
                        continue;
                    }
                    let (row, terminated) = match line.strip_suffix(';') {
                        Some(rest) => (rest.trim_end(), true),
                        None => (line, false),
                    };

                    if row == "," {
                        beatmap.close_measure(&mut current);
                    } else if row.chars().count() == ROW_WIDTH {
                        current.push(decode_row(row));
                    } else if !row.is_empty() {
                        beatmap.ignored_rows += 1;
                        debug!("Ignoring malformed chart row '{}'", row);
                    }

                    if terminated {
                        stage = Stage::Done;
                    }
                }
                Stage::Done => break,
            }
        }

        match stage {
            Stage::SeekTempo => warn!("No {} line found; tempo left at 0.", TEMPO_TAG),
            Stage::SeekBlock => warn!("No '{}:' block found; chart is empty.", difficulty),
            Stage::Collecting | Stage::Done => {
                // A delimiter right before the block end leaves nothing behind it.
                if !current.is_empty() || beatmap.measures.is_empty() {
                    beatmap.close_measure(&mut current);
                }
            }
        }

        beatmap
    }

    fn close_measure(&mut self, current: &mut Vec<NoteSlot>) {
        self.max_slots_per_measure = self.max_slots_per_measure.max(current.len());
        self.measures.push(std::mem::take(current));
    }

    #[inline(always)]
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    #[inline(always)]
    pub fn measure_count(&self) -> usize {
        self.measures.len()
    }

    pub fn max_slots_per_measure(&self) -> usize {
        self.max_slots_per_measure
    }

    pub fn ignored_rows(&self) -> usize {
        self.ignored_rows
    }

    pub fn measures(&self) -> impl Iterator<Item = &[NoteSlot]> {
        self.measures.iter().map(Vec::as_slice)
    }

    pub fn measure(&self, index: usize) -> Result<&[NoteSlot], BeatmapError> {
        self.measures
            .get(index)
            .map(Vec::as_slice)
            .ok_or(BeatmapError::MeasureOutOfRange { index, len: self.measures.len() })
    }

    pub fn note(&self, measure: usize, slot: usize) -> Result<NoteSlot, BeatmapError> {
        let slots = self.measure(measure)?;
        slots
            .get(slot)
            .copied()
            .ok_or(BeatmapError::SlotOutOfRange { measure, slot, len: slots.len() })
    }

    pub fn note_count(&self) -> usize {
        self.measures.iter().flatten().filter(|s| s.is_some()).count()
    }
}

/// Forward-only playback position inside a [`Beatmap`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BeatCursor {
    pub measure: usize,
    pub slot: usize,
}

impl BeatCursor {
    pub const fn start() -> Self {
        Self { measure: 0, slot: 0 }
    }

    /// True once every measure has been consumed.
    #[inline(always)]
    pub fn is_finished(&self, beatmap: &Beatmap) -> bool {
        self.measure >= beatmap.measure_count()
    }

    /// Steps one slot, rolling into the next measure at the end of this one.
    /// Returns `true` when the step crossed a measure boundary.
    pub fn advance(&mut self, beatmap: &Beatmap) -> bool {
        let len = beatmap.measure(self.measure).map_or(0, <[NoteSlot]>::len);
        self.slot += 1;
        if self.slot >= len {
            self.slot = 0;
            self.measure += 1;
            return true;
        }
        false
    }
}

/// The first column holding a nonzero digit picks the lane; a row without
/// one is empty.
pub fn decode_row(row: &str) -> NoteSlot {
    row.chars()
        .take(ROW_WIDTH)
        .enumerate()
        .find(|(_, ch)| matches!(ch, '1'..='9'))
        .map(|(column, _)| column % LANE_COUNT)
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// `line` arrives trimmed; the label itself must match exactly.
fn is_block_label(line: &str, difficulty: &str) -> bool {
    line.strip_suffix(':') == Some(difficulty)
}

/// Integer tempo from a `#BPMS:` value such as `0.000=120.000;`.
fn parse_tempo(value: &str) -> u32 {
    let after_eq = value.split_once('=').map_or(value, |(_, v)| v);
    let digits: String = after_eq
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    match digits.parse::<u32>() {
        Ok(bpm) => bpm,
        Err(_) => {
            warn!("Unreadable tempo value '{}', using 0.", value.trim());
            0
        }
    }
}

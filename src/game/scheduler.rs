use crate::core::recycler::{Recyclable, Recycler, Slot};
use crate::core::scene::{Entity, EntityKind, Scene};
use crate::game::judgment::Judgment;
use crate::game::node::{MIN_ARRIVAL_TIME, MusicNode};
use crate::game::parsing::beatmap::{BeatCursor, Beatmap, NoteSlot};
use crate::game::player::Player;
use crate::game::rail::{LANE_COUNT, RailSet};
use log::{debug, info, warn};
use thiserror::Error;

/// Every node ever built lives here; the scheduler only holds slots into it.
pub type NodePool = Recycler<MusicNode>;

/// Beats in one measure. Tempo is quoted per beat, the chart is split per
/// measure.
const BEATS_PER_MEASURE: f32 = 4.0;

/// Longest step one update may simulate. Longer stalls are dropped, not
/// caught up.
pub const MAX_DELTA_TIME: f32 = 0.1;

/// Frame step the simulation will accept: finite, non-negative and at most
/// [`MAX_DELTA_TIME`]. Anything else counts as a zero step.
pub fn clamp_delta(delta_time: f32) -> f32 {
    if delta_time.is_finite() {
        delta_time.clamp(0.0, MAX_DELTA_TIME)
    } else {
        warn!("Ignoring non-finite frame step {}.", delta_time);
        0.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("beatmap tempo is zero")]
    ZeroTempo,
    #[error("beatmap has no measures")]
    NoMeasures,
    #[error("measure {0} has no slots")]
    EmptyMeasure(usize),
    #[error("lane {lane} out of range (lane count {lane_count})")]
    LaneOutOfRange { lane: usize, lane_count: usize },
}

/// What one scheduler tick did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub spawned: u32,
    pub hits: u32,
    pub misses: u32,
    pub reclaimed: u32,
    /// Judgments in the order they were made this tick.
    pub judgments: Vec<Judgment>,
}

struct Chart {
    beatmap: Beatmap,
    seconds_per_measure: f32,
    cursor: BeatCursor,
    timer: f32,
}

impl Chart {
    fn slot_interval(&self) -> Option<f32> {
        let slots = self.beatmap.measure(self.cursor.measure).ok()?.len();
        (slots > 0).then(|| self.seconds_per_measure / slots as f32)
    }

    /// Pops the next due slot, if the accumulated timer covers one.
    fn next_due(&mut self) -> Option<NoteSlot> {
        let interval = self.slot_interval()?;
        if self.timer < interval {
            return None;
        }
        self.timer -= interval;
        let note = self
            .beatmap
            .note(self.cursor.measure, self.cursor.slot)
            .ok()?;
        if self.cursor.advance(&self.beatmap) {
            debug!("Measure {} begins.", self.cursor.measure);
        }
        Some(note)
    }
}

/// Spawns nodes on the chart's cadence, moves them, judges them against the
/// player, and hands retired ones back to the pool.
pub struct NodeScheduler {
    chart: Option<Chart>,
    arrival_time: f32,
    live: Vec<Slot>,
    fresh_allocations: u32,
    finished_logged: bool,
}

impl NodeScheduler {
    pub fn new(beatmap: Beatmap, arrival_time: f32) -> Result<Self, SchedulerError> {
        if beatmap.bpm() == 0 {
            return Err(SchedulerError::ZeroTempo);
        }
        if beatmap.measure_count() == 0 {
            return Err(SchedulerError::NoMeasures);
        }
        if let Some(index) = beatmap.measures().position(<[NoteSlot]>::is_empty) {
            return Err(SchedulerError::EmptyMeasure(index));
        }

        let seconds_per_measure = 60.0 * BEATS_PER_MEASURE / beatmap.bpm() as f32;
        info!(
            "Scheduler ready: {} BPM, {:.3}s per measure, {} notes.",
            beatmap.bpm(),
            seconds_per_measure,
            beatmap.note_count()
        );

        let mut scheduler = Self::silent(arrival_time);
        scheduler.chart = Some(Chart {
            beatmap,
            seconds_per_measure,
            cursor: BeatCursor::start(),
            timer: 0.0,
        });
        Ok(scheduler)
    }

    /// A scheduler with no chart. It never spawns on its own.
    pub fn silent(arrival_time: f32) -> Self {
        let arrival_time = if arrival_time.is_finite() && arrival_time >= MIN_ARRIVAL_TIME {
            arrival_time
        } else {
            warn!(
                "Arrival time {} too small; using {}.",
                arrival_time, MIN_ARRIVAL_TIME
            );
            MIN_ARRIVAL_TIME
        };
        Self {
            chart: None,
            arrival_time,
            live: Vec::new(),
            fresh_allocations: 0,
            finished_logged: false,
        }
    }

    #[inline(always)]
    pub fn arrival_time(&self) -> f32 {
        self.arrival_time
    }

    pub fn cursor(&self) -> Option<BeatCursor> {
        self.chart.as_ref().map(|c| c.cursor)
    }

    pub fn seconds_per_measure(&self) -> Option<f32> {
        self.chart.as_ref().map(|c| c.seconds_per_measure)
    }

    /// Seconds between slots of the measure under the cursor.
    pub fn slot_interval(&self) -> Option<f32> {
        self.chart.as_ref().and_then(Chart::slot_interval)
    }

    /// True for a silent scheduler or once the last measure has played.
    pub fn is_finished(&self) -> bool {
        self.chart
            .as_ref()
            .is_none_or(|c| c.cursor.is_finished(&c.beatmap))
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_nodes<'a>(&'a self, pool: &'a NodePool) -> impl Iterator<Item = &'a MusicNode> + 'a {
        self.live.iter().filter_map(|slot| pool.get(*slot))
    }

    /// Nodes built because the pool had nothing to hand out.
    pub fn fresh_allocations(&self) -> u32 {
        self.fresh_allocations
    }

    /// Puts a node on `lane`, `time` seconds out. Reuses a pooled node when one
    /// is free, otherwise builds one and registers its entity with the scene.
    pub fn add_node(
        &mut self,
        lane: usize,
        time: f32,
        pool: &mut NodePool,
        rails: &RailSet,
        scene: &mut Scene,
    ) -> Result<Slot, SchedulerError> {
        if lane >= LANE_COUNT {
            return Err(SchedulerError::LaneOutOfRange { lane, lane_count: LANE_COUNT });
        }

        let reused = pool.reactivate().and_then(|slot| {
            let node = pool.get_mut(slot)?;
            node.set_time(time);
            node.set_rail(lane, rails, scene);
            if let Some(entity) = scene.entity_mut(node.entity()) {
                entity.activate();
            }
            Some(slot)
        });

        let slot = match reused {
            Some(slot) => slot,
            None => {
                self.fresh_allocations = self.fresh_allocations.saturating_add(1);
                debug!(
                    "Node pool empty; allocating node #{} ({} tracked).",
                    self.fresh_allocations,
                    pool.len()
                );
                let mut entity = Entity::new(EntityKind::Node);
                entity.activate();
                let id = scene.register(entity);
                let mut node = MusicNode::new(id, lane, time);
                node.set_rail(lane, rails, scene);
                pool.insert(node)
            }
        };

        self.live.push(slot);
        Ok(slot)
    }

    /// One frame: spawn, move, judge, reclaim, strictly in that order. The
    /// step goes through [`clamp_delta`] first.
    pub fn update(
        &mut self,
        delta_time: f32,
        pool: &mut NodePool,
        player: &mut Player,
        rails: &RailSet,
        scene: &mut Scene,
    ) -> TickSummary {
        let delta_time = clamp_delta(delta_time);
        let mut summary = TickSummary::default();

        self.spawn_due(delta_time, pool, rails, scene, &mut summary);

        for slot in &self.live {
            if let Some(node) = pool.get_mut(*slot) {
                node.update(delta_time, rails, scene);
            }
        }

        for slot in &self.live {
            let Some(node) = pool.get_mut(*slot) else { continue };
            if !node.awaiting_judgment() {
                continue;
            }
            if node.rail() == player.current_rail() {
                if node.hit() {
                    player.hit(scene);
                    summary.hits += 1;
                    summary.judgments.push(Judgment::Hit);
                    debug!("HIT on rail {}", node.rail());
                }
            } else if node.miss() {
                summary.misses += 1;
                summary.judgments.push(Judgment::Miss);
                debug!("MISS on rail {} (player on {})", node.rail(), player.current_rail());
            }
        }

        self.live.retain(|slot| {
            let Some(node) = pool.get(*slot) else { return false };
            if !node.is_dead() {
                return true;
            }
            if let Some(entity) = scene.entity_mut(node.entity()) {
                entity.deactivate();
            }
            pool.deactivate(*slot);
            summary.reclaimed += 1;
            false
        });

        summary
    }

    fn spawn_due(
        &mut self,
        delta_time: f32,
        pool: &mut NodePool,
        rails: &RailSet,
        scene: &mut Scene,
        summary: &mut TickSummary,
    ) {
        let Some(chart) = self.chart.as_mut() else { return };
        if chart.cursor.is_finished(&chart.beatmap) {
            if !self.finished_logged {
                info!("Beatmap finished; no more nodes will spawn.");
                self.finished_logged = true;
            }
            return;
        }

        chart.timer += delta_time;
        let mut due = Vec::new();
        while let Some(note) = chart.next_due() {
            if let Some(lane) = note {
                due.push(lane);
            }
        }

        let arrival = self.arrival_time;
        for lane in due {
            match self.add_node(lane, arrival, pool, rails, scene) {
                Ok(_) => summary.spawned += 1,
                Err(e) => warn!("Skipping chart note: {}", e),
            }
        }
    }
}

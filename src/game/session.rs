use crate::config::Config;
use crate::core::input::InputState;
use crate::core::scene::Scene;
use crate::game::autoplay;
use crate::game::judgment::JudgmentTally;
use crate::game::parsing::beatmap::Beatmap;
use crate::game::player::Player;
use crate::game::rail::{LANE_COUNT, RailSet};
use crate::game::scheduler::{self, NodePool, NodeScheduler, TickSummary};
use log::{error, info};

pub struct Session {
    pool: NodePool,
    scheduler: NodeScheduler,
    player: Player,
    rails: RailSet,
    scene: Scene,
    tally: JudgmentTally,
    spawned: u32,
    elapsed: f32,
    log_timer: f32,
}

impl Session {
    pub fn new(scheduler: NodeScheduler, scene: Scene, default_reset: bool) -> Self {
        let mut scene = scene;
        let rails = RailSet::evenly_spaced(&mut scene);
        let player = Player::new(&rails, &mut scene, default_reset);
        Self {
            pool: NodePool::with_capacity(32),
            scheduler,
            player,
            rails,
            scene,
            tally: JudgmentTally::default(),
            spawned: 0,
            elapsed: 0.0,
            log_timer: 0.0,
        }
    }

    /// Builds a session from the configured chart. A chart that fails to load
    /// or validate yields a session that never spawns.
    pub fn from_config(config: &Config) -> Self {
        let scheduler = Beatmap::open(&config.beatmap_path, &config.difficulty)
            .map_err(|e| e.to_string())
            .and_then(|map| NodeScheduler::new(map, config.arrival_time).map_err(|e| e.to_string()));
        let scheduler = match scheduler {
            Ok(scheduler) => scheduler,
            Err(e) => {
                error!("Beatmap unusable ({}); starting a silent session.", e);
                NodeScheduler::silent(config.arrival_time)
            }
        };
        Self::new(scheduler, Scene::new(), config.default_reset)
    }

    pub fn update(&mut self, delta_time: f32, input: InputState) -> TickSummary {
        let dt = scheduler::clamp_delta(delta_time);
        self.elapsed += dt;

        self.player.update(dt, input, &self.rails, &mut self.scene);
        let summary = self.scheduler.update(
            dt,
            &mut self.pool,
            &mut self.player,
            &self.rails,
            &mut self.scene,
        );
        self.scene.update(dt);

        self.spawned = self.spawned.saturating_add(summary.spawned);
        for judgment in &summary.judgments {
            self.tally.record(*judgment);
        }

        self.log_timer += dt;
        if self.log_timer >= 1.0 {
            info!(
                "Time: {:.2}, Live nodes: {}, Hits: {}, Misses: {}, Combo: {}",
                self.elapsed,
                self.scheduler.live_count(),
                self.tally.hits,
                self.tally.misses,
                self.tally.combo
            );
            self.log_timer -= 1.0;
        }

        summary
    }

    /// Input an autopilot would hold this frame.
    pub fn autoplay_input(&self) -> InputState {
        autoplay::input_for(
            self.player.current_rail(),
            self.scheduler.live_nodes(&self.pool),
        )
    }

    /// Chart exhausted and every node judged and reclaimed.
    pub fn is_complete(&self) -> bool {
        self.scheduler.is_finished() && self.scheduler.live_count() == 0
    }

    pub fn tally(&self) -> JudgmentTally {
        self.tally
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn scheduler(&self) -> &NodeScheduler {
        &self.scheduler
    }

    /// One-line lane view plus score, e.g. `[ ][P][ ] | hits 3 | misses 1 | combo 2`.
    pub fn status_line(&self) -> String {
        let mut lanes = String::with_capacity(LANE_COUNT * 3);
        for lane in 0..LANE_COUNT {
            let incoming = self
                .scheduler
                .live_nodes(&self.pool)
                .any(|n| n.rail() == lane && n.time() > 0.0);
            let mark = match (lane == self.player.current_rail(), incoming) {
                (true, true) => '*',
                (true, false) => 'P',
                (false, true) => 'o',
                (false, false) => ' ',
            };
            lanes.push('[');
            lanes.push(mark);
            lanes.push(']');
        }
        format!(
            "{} | hits {} | misses {} | combo {}",
            lanes, self.tally.hits, self.tally.misses, self.tally.combo
        )
    }

    pub fn log_summary(&self) {
        info!(
            "Session over after {:.1}s: {} spawned, {} hits, {} misses, max combo {}, accuracy {:.1}%, {} nodes allocated.",
            self.elapsed,
            self.spawned,
            self.tally.hits,
            self.tally.misses,
            self.tally.max_combo,
            self.tally.accuracy() * 100.0,
            self.pool.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::particles::ParticleField;
    use crate::game::scheduler::MAX_DELTA_TIME;

    const DEMO: &str = "\
#BPMS:0.000=120.000;
     Easy:
1000
0100
0010
0100
,
0001
0000
0100
0000
;
";

    fn session(default_reset: bool) -> Session {
        let map = Beatmap::parse(DEMO, "Easy");
        let scheduler = NodeScheduler::new(map, 1.0).expect("valid chart");
        Session::new(scheduler, Scene::with_particles(ParticleField::seeded(11)), default_reset)
    }

    fn run(session: &mut Session, autoplay: bool) {
        for _ in 0..2000 {
            if session.is_complete() {
                break;
            }
            let input = if autoplay { session.autoplay_input() } else { InputState::NONE };
            session.update(1.0 / 120.0, input);
        }
    }

    #[test]
    fn autoplay_hits_every_note() {
        let mut s = session(true);
        run(&mut s, true);
        assert!(s.is_complete(), "session should drain");
        assert_eq!(s.spawned(), 6);
        assert_eq!(s.tally().hits, 6);
        assert_eq!(s.tally().misses, 0);
        assert_eq!(s.player().hits(), 6);
        assert_eq!(s.tally().max_combo, 6);
    }

    #[test]
    fn idle_player_only_hits_middle_lane() {
        let mut s = session(true);
        run(&mut s, false);
        assert!(s.is_complete());
        // lanes: 0, 1, 2, 1, 0, 1
        assert_eq!(s.tally().hits, 3);
        assert_eq!(s.tally().misses, 3);
    }

    #[test]
    fn nodes_are_reused_across_the_chart() {
        let mut s = session(true);
        run(&mut s, true);
        assert!(
            s.scheduler().fresh_allocations() < s.spawned(),
            "pool should recycle: {} allocations for {} spawns",
            s.scheduler().fresh_allocations(),
            s.spawned()
        );
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut s = session(true);
        s.update(5.0, InputState::NONE);
        assert!((s.elapsed() - MAX_DELTA_TIME).abs() < 1e-6);
    }

    #[test]
    fn non_finite_frames_are_ignored() {
        let mut s = session(true);
        s.update(f32::NAN, InputState::NONE);
        s.update(f32::INFINITY, InputState::NONE);
        assert_eq!(s.elapsed(), 0.0);
        assert_eq!(s.spawned(), 0);
        assert_eq!(s.player().current_rail(), s.player().default_rail());
        run(&mut s, true);
        assert!(s.is_complete());
        assert_eq!(s.tally().hits, 6);
    }

    #[test]
    fn quick_arrival_is_never_judged_on_spawn() {
        let map = Beatmap::parse("#BPMS:0=120;\nEasy:\n0100\n0000\n0000\n0000\n;\n", "Easy");
        let scheduler = NodeScheduler::new(map, 0.01).expect("valid chart");
        let mut s = Session::new(scheduler, Scene::with_particles(ParticleField::seeded(2)), true);
        for dt in [0.1, 0.1, 0.1, 0.1, 0.09] {
            let tick = s.update(dt, InputState::NONE);
            assert_eq!(tick.spawned, 0);
        }
        let tick = s.update(MAX_DELTA_TIME, InputState::NONE);
        assert_eq!(tick.spawned, 1);
        assert!(tick.judgments.is_empty(), "judged on the tick it spawned");

        let mut hits = 0;
        for _ in 0..5 {
            hits += s.update(MAX_DELTA_TIME, InputState::NONE).hits;
        }
        assert_eq!(hits, 1);
    }

    #[test]
    fn status_line_marks_player_lane() {
        let s = session(true);
        assert!(s.status_line().starts_with("[ ][P][ ]"), "got {}", s.status_line());
    }

    #[test]
    fn missing_chart_gives_silent_session() {
        let config = Config {
            beatmap_path: std::env::temp_dir()
                .join("railbeat-missing.sm")
                .to_string_lossy()
                .into_owned(),
            ..Config::default()
        };
        let mut s = Session::from_config(&config);
        for _ in 0..100 {
            s.update(0.05, InputState::NONE);
        }
        assert_eq!(s.spawned(), 0);
        assert!(s.is_complete());
    }
}

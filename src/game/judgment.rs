#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Judgment {
    Hit,
    Miss,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JudgmentTally {
    pub hits: u32,
    pub misses: u32,
    pub combo: u32,
    pub max_combo: u32,
}

impl JudgmentTally {
    pub fn record(&mut self, judgment: Judgment) {
        match judgment {
            Judgment::Hit => {
                self.hits = self.hits.saturating_add(1);
                self.combo = self.combo.saturating_add(1);
                self.max_combo = self.max_combo.max(self.combo);
            }
            Judgment::Miss => {
                self.misses = self.misses.saturating_add(1);
                self.combo = 0;
            }
        }
    }

    #[inline(always)]
    pub fn judged(&self) -> u32 {
        self.hits.saturating_add(self.misses)
    }

    /// Share of judged nodes that were hits, `0.0..=1.0`.
    pub fn accuracy(&self) -> f64 {
        let judged = self.judged();
        if judged == 0 {
            return 0.0;
        }
        self.hits as f64 / judged as f64
    }
}

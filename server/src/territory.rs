use crate::geometry::GridLayout;
use crate::team::Team;
use knitting_shared::config::GameConfig;

/// Highest ownership level a cell can reach
pub const MAX_LEVEL: u8 = 5;

/// One unit of territory. `team` is None exactly when `level` is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub team: Option<Team>,
    pub level: u8,
}

/// A cell whose state changed, with its state after the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellChange {
    pub col: usize,
    pub row: usize,
    pub cell: Cell,
}

/// Running totals per team. Only ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeamScore {
    pub red: u64,
    pub blue: u64,
}

impl TeamScore {
    #[cfg(test)]
    pub fn get(&self, team: Team) -> u64 {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }

    fn add(&mut self, team: Team, amount: u64) {
        let slot = match team {
            Team::Red => &mut self.red,
            Team::Blue => &mut self.blue,
        };
        *slot = slot.saturating_add(amount);
    }
}

/// Fixed grid of team-owned cells covering the arena.
pub struct TerritoryGrid {
    layout: GridLayout,
    cells: Vec<Cell>,
}

impl TerritoryGrid {
    pub fn new(layout: GridLayout) -> Self {
        Self {
            layout,
            cells: vec![Cell::default(); layout.cols * layout.rows],
        }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(GridLayout::centered(
            config.cols(),
            config.rows(),
            config.cell_size,
            config.arena_width,
            config.arena_height,
        ))
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    fn index(&self, col: usize, row: usize) -> Option<usize> {
        (col < self.layout.cols && row < self.layout.rows).then(|| row * self.layout.cols + col)
    }

    pub fn get(&self, col: usize, row: usize) -> Option<Cell> {
        self.index(col, row).map(|i| self.cells[i])
    }

    /// Apply one claim of `strength` for `team` to every listed cell.
    ///
    /// Own cells gain strength up to `MAX_LEVEL`, opposing cells lose it and fall back to
    /// unowned at 0, unowned cells are taken at `strength`. Cells outside the grid are skipped
    /// and a cell listed twice is claimed once. Returns the cells that actually changed.
    pub fn claim_cells(
        &mut self,
        cells: &[(usize, usize)],
        team: Team,
        strength: u8,
    ) -> Vec<CellChange> {
        let mut targets = cells.to_vec();
        targets.sort_unstable();
        targets.dedup();

        let mut changes = Vec::new();
        for (col, row) in targets {
            let Some(i) = self.index(col, row) else {
                continue;
            };
            let before = self.cells[i];
            let after = claimed(before, team, strength);
            if after != before {
                self.cells[i] = after;
                changes.push(CellChange {
                    col,
                    row,
                    cell: after,
                });
            }
        }
        changes
    }

    /// Number of cells owned by a team.
    pub fn owned_count(&self, team: Team) -> usize {
        self.cells
            .iter()
            .filter(|c| c.level > 0 && c.team == Some(team))
            .count()
    }

    /// Score accrual pass: each team gains `per_cell` for every cell it owns.
    pub fn accrue(&self, score: &mut TeamScore, per_cell: u64) {
        for team in Team::ALL {
            let owned = self.owned_count(team) as u64;
            score.add(team, owned.saturating_mul(per_cell));
        }
    }

    /// Every owned cell, for clients that join late.
    pub fn snapshot(&self) -> Vec<CellChange> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.level > 0)
            .map(|(i, &cell)| CellChange {
                col: i % self.layout.cols,
                row: i / self.layout.cols,
                cell,
            })
            .collect()
    }
}

fn claimed(cell: Cell, team: Team, strength: u8) -> Cell {
    match cell.team {
        Some(owner) if owner == team => Cell {
            team: Some(team),
            level: cell.level.saturating_add(strength).min(MAX_LEVEL),
        },
        Some(owner) => {
            let level = cell.level.saturating_sub(strength);
            if level == 0 {
                Cell::default()
            } else {
                Cell {
                    team: Some(owner),
                    level,
                }
            }
        }
        None if strength == 0 => Cell::default(),
        None => Cell {
            team: Some(team),
            level: strength.min(MAX_LEVEL),
        },
    }
}

//! Room layout: a carved grid maze with generators, an exit and the odd
//! terminal or pickup, plus the BFS helpers enemies walk with.

use crate::input::Direction;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

pub const ROOM_WIDTH: u32 = 21;
pub const ROOM_HEIGHT: u32 = 15;
/// Interior walls knocked out after carving so the maze has loops.
const EXTRA_OPENINGS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileKind {
    Floor,
    Wall,
    Generator { repaired: bool },
    Terminal { read: bool },
    /// Stamina battery.
    Pickup,
    Exit,
}

impl TileKind {
    pub fn walkable(self) -> bool {
        !matches!(self, TileKind::Wall)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Room {
    pub grid_size: GridSize,
    /// Row-major tiles; length = width * height.
    pub tiles: Vec<TileKind>,
    pub start: Position,
    pub exit: Position,
    /// Dark rooms enable the flashlight.
    pub dark: bool,
}

impl Room {
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        generators: u32,
        with_terminal: bool,
        dark: bool,
    ) -> Self {
        let grid_size = GridSize { width: ROOM_WIDTH, height: ROOM_HEIGHT };
        let mut room = Room {
            grid_size,
            tiles: vec![TileKind::Wall; (ROOM_WIDTH * ROOM_HEIGHT) as usize],
            start: Position::new(1, 1),
            exit: Position::new(1, 1),
            dark,
        };
        room.carve(rng);
        room.open_loops(rng);

        let dist = room.distances_from(room.start, false);
        let mut floor: Vec<(Position, u32)> = room
            .positions()
            .filter_map(|p| dist[room.idx(p)].map(|d| (p, d)))
            .filter(|(p, _)| *p != room.start)
            .collect();
        if let Some((far, _)) = floor.iter().max_by_key(|(p, d)| (*d, p.y, p.x)).copied() {
            room.exit = far;
            room.set(far, TileKind::Exit);
        }
        floor.retain(|(p, d)| *p != room.exit && *d >= 4);
        floor.shuffle(rng);
        let mut spots = floor.into_iter().map(|(p, _)| p);
        for _ in 0..generators {
            if let Some(p) = spots.next() {
                room.set(p, TileKind::Generator { repaired: false });
            }
        }
        if with_terminal {
            if let Some(p) = spots.next() {
                room.set(p, TileKind::Terminal { read: false });
            }
        }
        if dark {
            if let Some(p) = spots.next() {
                room.set(p, TileKind::Pickup);
            }
        }
        room
    }

    /// Randomized depth-first carve over the odd cells.
    fn carve<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut stack = vec![self.start];
        self.set(self.start, TileKind::Floor);
        while let Some(&cur) = stack.last() {
            let mut dirs = Direction::ALL;
            dirs.shuffle(rng);
            let next = dirs.into_iter().find_map(|d| {
                let (dx, dy) = d.delta();
                let nx = cur.x as i32 + dx * 2;
                let ny = cur.y as i32 + dy * 2;
                let (w, h) = (self.grid_size.width as i32, self.grid_size.height as i32);
                if nx <= 0 || ny <= 0 || nx >= w - 1 || ny >= h - 1 {
                    return None;
                }
                let n = Position::new(nx as u32, ny as u32);
                (self.tile(n) == Some(TileKind::Wall)).then_some((d, n))
            });
            match next {
                Some((d, n)) => {
                    let (dx, dy) = d.delta();
                    let between =
                        Position::new((cur.x as i32 + dx) as u32, (cur.y as i32 + dy) as u32);
                    self.set(between, TileKind::Floor);
                    self.set(n, TileKind::Floor);
                    stack.push(n);
                }
                None => {
                    stack.pop();
                }
            }
        }
    }

    fn open_loops<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let gs = self.grid_size;
        let mut candidates: Vec<Position> = self
            .positions()
            .filter(|p| p.x > 0 && p.y > 0 && p.x < gs.width - 1 && p.y < gs.height - 1)
            .filter(|p| self.tile(*p) == Some(TileKind::Wall))
            .filter(|p| {
                let floor =
                    |x: u32, y: u32| self.tile(Position::new(x, y)) == Some(TileKind::Floor);
                (floor(p.x - 1, p.y) && floor(p.x + 1, p.y))
                    || (floor(p.x, p.y - 1) && floor(p.x, p.y + 1))
            })
            .collect();
        candidates.shuffle(rng);
        for p in candidates.into_iter().take(EXTRA_OPENINGS) {
            self.set(p, TileKind::Floor);
        }
    }

    fn idx(&self, p: Position) -> usize {
        (p.y * self.grid_size.width + p.x) as usize
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.grid_size.width && (y as u32) < self.grid_size.height
    }

    fn is_border(&self, p: Position) -> bool {
        p.x == 0 || p.y == 0 || p.x == self.grid_size.width - 1 || p.y == self.grid_size.height - 1
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let gs = self.grid_size;
        (0..gs.height).flat_map(move |y| (0..gs.width).map(move |x| Position::new(x, y)))
    }

    pub fn tile(&self, p: Position) -> Option<TileKind> {
        if self.in_bounds(p.x as i32, p.y as i32) { Some(self.tiles[self.idx(p)]) } else { None }
    }

    pub fn set(&mut self, p: Position, kind: TileKind) {
        if self.in_bounds(p.x as i32, p.y as i32) {
            let i = self.idx(p);
            self.tiles[i] = kind;
        }
    }

    /// Neighbour one step away. `phase` lets the step pass interior walls,
    /// never the outer border.
    pub fn step(&self, from: Position, dir: Direction, phase: bool) -> Option<Position> {
        let (dx, dy) = dir.delta();
        let (nx, ny) = (from.x as i32 + dx, from.y as i32 + dy);
        if !self.in_bounds(nx, ny) {
            return None;
        }
        let to = Position::new(nx as u32, ny as u32);
        let kind = self.tile(to)?;
        if kind.walkable() || (phase && !self.is_border(to)) { Some(to) } else { None }
    }

    pub fn generators_total(&self) -> usize {
        self.tiles.iter().filter(|t| matches!(t, TileKind::Generator { .. })).count()
    }

    pub fn generators_repaired(&self) -> usize {
        self.tiles
            .iter()
            .filter(|t| matches!(t, TileKind::Generator { repaired: true }))
            .count()
    }

    pub fn all_generators_repaired(&self) -> bool {
        self.generators_repaired() == self.generators_total()
    }

    /// BFS step counts from `from`; `None` for unreachable tiles.
    pub fn distances_from(&self, from: Position, ignore_walls: bool) -> Vec<Option<u32>> {
        let mut dist = vec![None; self.tiles.len()];
        let mut q = VecDeque::new();
        dist[self.idx(from)] = Some(0);
        q.push_back(from);
        while let Some(cur) = q.pop_front() {
            let d = dist[self.idx(cur)].unwrap_or(0);
            for dir in Direction::ALL {
                let Some(n) = self.step(cur, dir, ignore_walls) else { continue };
                let ni = self.idx(n);
                if dist[ni].is_none() {
                    dist[ni] = Some(d + 1);
                    q.push_back(n);
                }
            }
        }
        dist
    }

    /// Shortest path including both ends; empty when unreachable.
    pub fn path(&self, from: Position, to: Position, ignore_walls: bool) -> Vec<Position> {
        if self.tile(from).is_none() || self.tile(to).is_none() {
            return Vec::new();
        }
        let n = self.tiles.len();
        let mut visited = vec![false; n];
        let mut parent: Vec<Option<Position>> = vec![None; n];
        let mut q = VecDeque::new();
        visited[self.idx(from)] = true;
        q.push_back(from);
        while let Some(cur) = q.pop_front() {
            if cur == to {
                break;
            }
            for dir in Direction::ALL {
                let Some(nb) = self.step(cur, dir, ignore_walls) else { continue };
                let ni = self.idx(nb);
                if visited[ni] {
                    continue;
                }
                visited[ni] = true;
                parent[ni] = Some(cur);
                q.push_back(nb);
            }
        }
        if !visited[self.idx(to)] {
            return Vec::new();
        }
        let mut rev = vec![to];
        let mut cur = to;
        while let Some(p) = parent[self.idx(cur)] {
            rev.push(p);
            cur = p;
        }
        rev.reverse();
        rev
    }

    pub fn next_step_towards(
        &self,
        from: Position,
        to: Position,
        ignore_walls: bool,
    ) -> Option<Position> {
        self.path(from, to, ignore_walls).get(1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn generated_room_is_connected() {
        let mut rng = SmallRng::seed_from_u64(3);
        for gens in 3..=5 {
            let room = Room::generate(&mut rng, gens, true, true);
            assert_eq!(room.generators_total(), gens as usize);
            assert_eq!(room.tile(room.exit), Some(TileKind::Exit));
            let dist = room.distances_from(room.start, false);
            for p in room.positions() {
                if room.tile(p).is_some_and(|t| t.walkable()) {
                    assert!(dist[room.idx(p)].is_some(), "{p:?} unreachable");
                }
            }
            assert!(room.tiles.contains(&TileKind::Pickup));
            assert!(room.tiles.contains(&TileKind::Terminal { read: false }));
        }
    }

    #[test]
    fn path_and_phase_steps() {
        let mut rng = SmallRng::seed_from_u64(9);
        let room = Room::generate(&mut rng, 3, false, false);
        let path = room.path(room.start, room.exit, false);
        assert_eq!(path.first(), Some(&room.start));
        assert_eq!(path.last(), Some(&room.exit));
        for w in path.windows(2) {
            assert_eq!(w[0].manhattan(w[1]), 1);
        }
        // (1,1) always has border walls above and to the left
        assert_eq!(room.step(room.start, Direction::Up, true), None);
        assert_eq!(room.step(room.start, Direction::Left, true), None);
    }
}

use bracket_geometry::prelude::Point;
use bracket_terminal::prelude::VirtualKeyCode;
use std::{fs, io, path::Path};
use tracing::warn;

use crate::game::{Game, PlayerCommand};

const DEMO_SCRIPT: &str = "\
# wander east, fight whatever comes close, then tidy up
ddddffff.
gg1
ssssffff
aaaaffff.
ecg
wwwwffff
";

/// A keystroke script replayed in place of a live keyboard.
pub struct ScriptedInput {
    script_commands: Vec<VirtualKeyCode>,
    current_command_index: usize,
}

impl ScriptedInput {
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_script(&text))
    }

    /// One keypress per character. Blank lines and `#` comments are skipped.
    pub fn from_script(text: &str) -> Self {
        let mut script_commands = Vec::new();
        for line in text.lines() {
            let trimmed_line = line.trim();
            if trimmed_line.is_empty() || trimmed_line.starts_with('#') {
                continue;
            }
            for char_code in trimmed_line.chars() {
                match char_to_virtualkeycode(char_code) {
                    Some(key) => script_commands.push(key),
                    None => warn!(key = %char_code, "script_unknown_key"),
                }
            }
        }

        Self {
            script_commands,
            current_command_index: 0,
        }
    }

    pub fn demo() -> Self {
        Self::from_script(DEMO_SCRIPT)
    }

    pub fn len(&self) -> usize {
        self.script_commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script_commands.is_empty()
    }

    pub fn next_key(&mut self) -> Option<VirtualKeyCode> {
        let key = self.script_commands.get(self.current_command_index).copied()?;
        self.current_command_index += 1;
        Some(key)
    }
}

/// Resolves a key against the current game state. `None` means the key has
/// nothing to act on right now.
pub fn command_for(key: VirtualKeyCode, game: &Game) -> Option<PlayerCommand> {
    let step = |x, y| Some(PlayerCommand::Move(Point::new(x, y)));
    match key {
        VirtualKeyCode::Left | VirtualKeyCode::A | VirtualKeyCode::H => step(-1, 0),
        VirtualKeyCode::Right | VirtualKeyCode::D | VirtualKeyCode::L => step(1, 0),
        VirtualKeyCode::Up | VirtualKeyCode::W | VirtualKeyCode::K => step(0, -1),
        VirtualKeyCode::Down | VirtualKeyCode::S | VirtualKeyCode::J => step(0, 1),
        VirtualKeyCode::Period => Some(PlayerCommand::Pass),
        VirtualKeyCode::F => game
            .nearest_creature()
            .map(|(_, point)| PlayerCommand::AttackAt(point)),
        VirtualKeyCode::G => game.nearest_item_in_reach().map(PlayerCommand::PickUpAt),
        VirtualKeyCode::E => game
            .ecs
            .inventory()
            .and_then(|inventory| inventory.selected())
            .map(PlayerCommand::Eat),
        VirtualKeyCode::C => game
            .ecs
            .craftable_recipes(&game.rules)
            .first()
            .copied()
            .map(PlayerCommand::Craft),
        _ => {
            let slot = inventory_slot(key)?;
            let inventory = game.ecs.inventory()?;
            let (item, _) = inventory.held().nth(slot)?;
            Some(PlayerCommand::ToggleEquip(item))
        }
    }
}

pub fn is_quit(key: VirtualKeyCode) -> bool {
    key == VirtualKeyCode::Escape
}

fn inventory_slot(key: VirtualKeyCode) -> Option<usize> {
    let slot = match key {
        VirtualKeyCode::Key1 => 0,
        VirtualKeyCode::Key2 => 1,
        VirtualKeyCode::Key3 => 2,
        VirtualKeyCode::Key4 => 3,
        VirtualKeyCode::Key5 => 4,
        VirtualKeyCode::Key6 => 5,
        VirtualKeyCode::Key7 => 6,
        VirtualKeyCode::Key8 => 7,
        VirtualKeyCode::Key9 => 8,
        _ => return None,
    };
    Some(slot)
}

fn char_to_virtualkeycode(c: char) -> Option<VirtualKeyCode> {
    match c.to_ascii_lowercase() {
        'w' => Some(VirtualKeyCode::W),
        'a' => Some(VirtualKeyCode::A),
        's' => Some(VirtualKeyCode::S),
        'd' => Some(VirtualKeyCode::D),
        'h' => Some(VirtualKeyCode::H),
        'j' => Some(VirtualKeyCode::J),
        'k' => Some(VirtualKeyCode::K),
        'l' => Some(VirtualKeyCode::L),
        'f' => Some(VirtualKeyCode::F),
        'g' => Some(VirtualKeyCode::G),
        'e' => Some(VirtualKeyCode::E),
        'c' => Some(VirtualKeyCode::C),
        '1' => Some(VirtualKeyCode::Key1),
        '2' => Some(VirtualKeyCode::Key2),
        '3' => Some(VirtualKeyCode::Key3),
        '4' => Some(VirtualKeyCode::Key4),
        '5' => Some(VirtualKeyCode::Key5),
        '6' => Some(VirtualKeyCode::Key6),
        '7' => Some(VirtualKeyCode::Key7),
        '8' => Some(VirtualKeyCode::Key8),
        '9' => Some(VirtualKeyCode::Key9),
        '.' => Some(VirtualKeyCode::Period), // wait a turn
        'q' | '\x1B' => Some(VirtualKeyCode::Escape),
        _ => None,
    }
}

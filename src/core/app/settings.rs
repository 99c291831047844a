//! Edits coming from the configuration panel.
//!
//! Every edit replaces the stored configuration immediately. The running
//! session keeps the values it was created with until the chat restarts.

use tui_textarea::{Input, Key};

use super::{App, Focus};

impl App {
    pub fn set_assistant_name(&mut self, name: String) {
        self.ui.set_input_placeholder(&name);
        self.config.update(|config| config.name = name);
    }

    pub fn set_system_instruction(&mut self, instruction: String) {
        self.config
            .update(|config| config.system_instruction = instruction);
    }

    pub fn set_model(&mut self, model: &str) {
        self.config.update(|config| config.model = model.to_string());
    }

    pub fn cycle_model(&mut self, forward: bool) {
        let next = self.config.get().cycle_model(forward);
        self.set_model(next);
    }

    /// Routes an editing key to the focused configuration field.
    ///
    /// The name field is single-line, so Enter is ignored there. Returns
    /// `false` when the input box has focus.
    pub fn edit_focused_field(&mut self, input: Input) -> bool {
        match self.ui.focus {
            Focus::Input => false,
            Focus::Name => {
                if input.key == Key::Enter {
                    return true;
                }
                let name = self.ui.apply_name_edit(|ta| {
                    ta.input(input);
                });
                if name != self.config.get().name {
                    self.set_assistant_name(name);
                }
                true
            }
            Focus::Model => {
                match input.key {
                    Key::Left | Key::Up => self.cycle_model(false),
                    Key::Right | Key::Down | Key::Char(' ') => self.cycle_model(true),
                    _ => {}
                }
                true
            }
            Focus::Instruction => {
                let instruction = self.ui.apply_instruction_edit(|ta| {
                    ta.input(input);
                });
                if instruction != self.config.get().system_instruction {
                    self.set_system_instruction(instruction);
                }
                true
            }
        }
    }
}

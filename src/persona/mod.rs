//! Persona configuration
//!
//! A persona is plain data: who the assistant is (an ordered instruction
//! list), which model runs it, how answers are formatted, and the text the
//! interactive loop shows around the conversation. Different personas are
//! different values of the same type; see [`presets`].

pub mod presets;

use std::sync::Arc;

/// A reserved input token answered locally with static text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaCommand {
    /// Lower-case token the user types, e.g. `dmaic`
    pub token: String,
    /// One-line description for the banner
    pub summary: String,
    /// Text printed when the command is entered
    pub text: String,
}

impl MetaCommand {
    pub fn new(token: &str, summary: &str, text: impl Into<String>) -> Self {
        Self {
            token: token.to_ascii_lowercase(),
            summary: summary.to_string(),
            text: text.into(),
        }
    }
}

/// Text the interactive loop prints around the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    /// Printed before the connectivity probe
    pub startup: String,
    /// Printed once the probe succeeds
    pub ready: String,
    /// Session banner; `{model}` is replaced with the model identifier
    pub banner: Vec<String>,
    /// Printed (without newline) before each read
    pub prompt: String,
    /// Printed (without newline) before each answer
    pub response_header: String,
    /// Printed after each answer
    pub response_footer: String,
    pub farewell: String,
    /// Farewell when the session ends by interrupt
    pub interrupt_farewell: String,
    /// Prefix for turn errors
    pub error_prefix: String,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            startup: String::new(),
            ready: String::new(),
            banner: Vec::new(),
            prompt: "> ".to_string(),
            response_header: String::new(),
            response_footer: String::new(),
            farewell: "Goodbye!".to_string(),
            interrupt_farewell: "\nGoodbye!".to_string(),
            error_prefix: "Error: ".to_string(),
        }
    }
}

/// A named, fixed bundle of behavioural instructions
#[derive(Debug, Clone)]
pub struct Persona {
    name: String,
    model: String,
    instructions: Arc<[String]>,
    markdown: bool,
    show_tool_calls: bool,
    commands: Vec<MetaCommand>,
    presentation: Presentation,
}

impl Persona {
    /// Create a persona; instruction order is kept as given
    pub fn new<I, S>(name: impl Into<String>, model: impl Into<String>, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            model: model.into(),
            instructions: instructions.into_iter().map(Into::into).collect(),
            markdown: false,
            show_tool_calls: false,
            commands: Vec::new(),
            presentation: Presentation::default(),
        }
    }

    /// Ask the model for markdown-formatted answers
    pub fn with_markdown(mut self, markdown: bool) -> Self {
        self.markdown = markdown;
        self
    }

    /// Prefix answers with the tool invocations made to produce them
    pub fn with_tool_call_echo(mut self, show: bool) -> Self {
        self.show_tool_calls = show;
        self
    }

    /// Add a meta-command; a later command with the same token replaces the earlier one
    pub fn with_command(mut self, command: MetaCommand) -> Self {
        self.commands.retain(|c| c.token != command.token);
        self.commands.push(command);
        self
    }

    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    pub fn markdown(&self) -> bool {
        self.markdown
    }

    pub fn show_tool_calls(&self) -> bool {
        self.show_tool_calls
    }

    pub fn commands(&self) -> &[MetaCommand] {
        &self.commands
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// Meta-command for an already trimmed input, matched case-insensitively
    pub fn command(&self, input: &str) -> Option<&MetaCommand> {
        let token = input.to_ascii_lowercase();
        self.commands.iter().find(|c| c.token == token)
    }

    /// Banner lines with the model identifier filled in
    pub fn banner(&self) -> Vec<String> {
        self.presentation
            .banner
            .iter()
            .map(|line| line.replace("{model}", &self.model))
            .collect()
    }

    /// The system message handed to the model, instructions in priority order
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::from("<instructions>\n");
        for instruction in self.instructions.iter() {
            prompt.push_str(instruction);
            prompt.push('\n');
        }
        prompt.push_str("</instructions>");
        if self.markdown {
            prompt.push_str("\n\nUse markdown to format your answers.");
        }
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_keeps_order() {
        let persona = Persona::new("t", "llama2", ["first", "second", "third"]);
        let prompt = persona.system_prompt();
        let first = prompt.find("first").unwrap();
        let second = prompt.find("second").unwrap();
        let third = prompt.find("third").unwrap();
        assert!(first < second && second < third);
        assert!(!prompt.contains("markdown"));

        let prompt = persona.with_markdown(true).system_prompt();
        assert!(prompt.ends_with("Use markdown to format your answers."));
    }

    #[test]
    fn test_command_lookup_is_case_insensitive() {
        let persona = Persona::new("t", "m", Vec::<String>::new())
            .with_command(MetaCommand::new("DMAIC", "template", "T1"))
            .with_command(MetaCommand::new("dmaic", "template", "T2"));
        assert_eq!(persona.commands().len(), 1);
        assert_eq!(persona.command("DmAiC").unwrap().text, "T2");
        assert!(persona.command("tools").is_none());
    }

    #[test]
    fn test_banner_fills_model() {
        let persona = Persona::new("t", "qwen3", ["x"]).with_presentation(Presentation {
            banner: vec!["Model: {model}".to_string()],
            ..Presentation::default()
        });
        assert_eq!(persona.banner(), vec!["Model: qwen3".to_string()]);
    }

    #[test]
    fn test_clones_share_instructions() {
        let persona = Persona::new("t", "m", ["a", "b"]);
        let copy = persona.clone();
        assert_eq!(persona.instructions(), copy.instructions());
        assert!(std::ptr::eq(persona.instructions(), copy.instructions()));
    }
}

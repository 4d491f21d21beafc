//! Interactive editing of the element configuration.

use std::io::{BufRead, Write};

use crate::{
    config::{ElementConfig, ImageElementConfig, Opacity, Position},
    foundation::{color::Rgba8, error::CardResult},
    render::ElementKind,
    workspace::{Workspace, list_images},
};

/// Line-oriented prompt session over arbitrary reader/writer pairs.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and read one trimmed line. End of input reads as an empty answer.
    pub fn ask(&mut self, question: &str) -> CardResult<String> {
        write!(self.output, "{question}: ")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_owned())
    }

    pub fn say(&mut self, line: &str) -> CardResult<()> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }

    /// `Some(true)` for y, `Some(false)` for n, `None` for anything else.
    fn ask_yes_no(&mut self, question: &str, current: bool) -> CardResult<Option<bool>> {
        let answer = self.ask(&format!(
            "{question} (Y/N, current: {})",
            if current { "Y" } else { "N" }
        ))?;
        Ok(match answer.to_ascii_lowercase().as_str() {
            "y" => Some(true),
            "n" => Some(false),
            _ => None,
        })
    }

    fn ask_position(&mut self, label: &str, current: Position) -> CardResult<Position> {
        let answer = self.ask(&format!(
            "{label} position (top/center/bottom, current: {current})"
        ))?;
        Ok(Position::parse(&answer).unwrap_or(current))
    }

    fn ask_offset(&mut self, label: &str, current: i32) -> CardResult<i32> {
        let answer = self.ask(&format!("{label} Y offset (current: {current})"))?;
        match answer.parse() {
            Ok(v) => Ok(v),
            Err(_) => {
                self.say("Invalid offset. Keeping current value.")?;
                Ok(current)
            }
        }
    }

    fn ask_opacity(&mut self, label: &str, current: Opacity) -> CardResult<Opacity> {
        let answer = self.ask(&format!(
            "{label} opacity (0.0-1.0, current: {})",
            current.get()
        ))?;
        match answer.parse::<f32>().ok().and_then(Opacity::try_new) {
            Some(v) => Ok(v),
            None => {
                self.say("Invalid opacity. Keeping current value.")?;
                Ok(current)
            }
        }
    }

    fn ask_color(&mut self, label: &str, current: Rgba8) -> CardResult<Rgba8> {
        let answer = self.ask(&format!("{label} (hex code, current: {})", current.to_hex()))?;
        if answer.is_empty() {
            return Ok(current);
        }
        match Rgba8::parse(&answer) {
            Ok(c) => Ok(c),
            Err(_) => {
                self.say("Invalid color. Keeping current value.")?;
                Ok(current)
            }
        }
    }

    fn choose_asset(
        &mut self,
        kind: ElementKind,
        workspace: &Workspace,
        current: &str,
    ) -> CardResult<Option<String>> {
        let dir = workspace.element_dir(kind);
        let files = list_images(dir)?;
        if files.is_empty() {
            self.say(&format!(
                "No {kind} files found. Add images to {}.",
                dir.display()
            ))?;
            return Ok(None);
        }

        self.say(&format!("\nAvailable {kind} files:"))?;
        for (i, name) in files.iter().enumerate() {
            self.say(&format!("{}. {name}", i + 1))?;
        }
        let answer = self.ask(&format!(
            "Select {kind} (1-{}, current: {current})",
            files.len()
        ))?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=files.len()).contains(&n) => Ok(Some(files[n - 1].clone())),
            _ => {
                self.say(&format!("Invalid choice. Keeping current {kind}."))?;
                Ok(None)
            }
        }
    }

    fn configure_image_element(
        &mut self,
        kind: ElementKind,
        workspace: &Workspace,
        element: &mut ImageElementConfig,
        enabled: &mut bool,
    ) -> CardResult<()> {
        let label = capitalize(kind.as_str());
        self.say(&format!("\n{label} Settings:"))?;
        match self.ask_yes_no(&format!("Use custom {kind}?"), *enabled)? {
            Some(true) => *enabled = true,
            Some(false) => {
                *enabled = false;
                return Ok(());
            }
            None => return Ok(()),
        }

        if let Some(file) = self.choose_asset(kind, workspace, &element.file)? {
            element.file = file;
        }
        if kind != ElementKind::Border {
            element.position = self.ask_position(&label, element.position)?;
            element.offset_y = self.ask_offset(&label, element.offset_y)?;
        }
        element.opacity = self.ask_opacity(&label, element.opacity)?;
        Ok(())
    }

    fn configure_text(&mut self, config: &mut ElementConfig) -> CardResult<()> {
        self.say("\nText Settings:")?;
        match self.ask_yes_no(
            "Add text directly to cards?",
            config.use_custom_elements.text,
        )? {
            Some(true) => config.use_custom_elements.text = true,
            Some(false) => {
                config.use_custom_elements.text = false;
                return Ok(());
            }
            None => return Ok(()),
        }

        let text = &mut config.text;
        let font = self.ask(&format!("Font name (current: {})", text.font))?;
        if !font.is_empty() {
            text.font = font;
        }

        let size = self.ask(&format!("Font size (current: {})", text.size))?;
        match size.parse::<u32>() {
            Ok(v) if v > 0 => text.size = v,
            _ => self.say("Invalid size. Keeping current value.")?,
        }

        text.color = self.ask_color("Text color", text.color)?;

        let width = self.ask(&format!(
            "Stroke width (0 for none, current: {})",
            text.stroke_width
        ))?;
        match width.parse::<u32>() {
            Ok(v) => text.stroke_width = v,
            Err(_) => self.say("Invalid width. Keeping current value.")?,
        }
        if text.stroke_width > 0 {
            text.stroke_color = self.ask_color("Stroke color", text.stroke_color)?;
        }

        text.position = self.ask_position("Text", text.position)?;
        text.offset_y = self.ask_offset("Text", text.offset_y)?;
        Ok(())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Walk through every element, persist the result to the workspace config path and ask
/// whether to process cards now.
pub fn run_configure<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    workspace: &Workspace,
    config: &mut ElementConfig,
) -> CardResult<bool> {
    prompter.say("\nConfigure Element Settings")?;

    let toggles = &mut config.use_custom_elements;
    prompter.configure_image_element(
        ElementKind::Border,
        workspace,
        &mut config.border,
        &mut toggles.border,
    )?;
    prompter.configure_image_element(
        ElementKind::Nameplate,
        workspace,
        &mut config.nameplate,
        &mut toggles.nameplate,
    )?;
    prompter.configure_image_element(
        ElementKind::Numeral,
        workspace,
        &mut config.numeral,
        &mut toggles.numeral,
    )?;
    prompter.configure_text(config)?;

    config.save(&workspace.config_path)?;
    prompter.say(&format!(
        "Configuration saved to {}",
        workspace.config_path.display()
    ))?;

    let answer = prompter.ask("\nProcess cards now? (Y/N)")?;
    Ok(answer.eq_ignore_ascii_case("y"))
}

use console::{Emoji, style};

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static GLOBE: Emoji<'_, '_> = Emoji("🌐 ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");
pub static SPEAKER: Emoji<'_, '_> = Emoji("🔊 ", "");
pub static ROBOT: Emoji<'_, '_> = Emoji("🤖 ", "> ");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_status(label: &str, msg: &str) {
    println!("  {} {}: {}", GEAR, style(label).bold().cyan(), msg);
}

pub fn print_step(step: &str) {
    println!("{} {}", SPARKLE, style(step).bold());
}

pub fn print_link(label: &str, url: &str) {
    println!(
        "  {} {}: {}",
        GLOBE,
        style(label).bold(),
        style(url).underlined().cyan()
    );
}

pub fn print_assistant(msg: &str) {
    println!("{}{}", ROBOT, style(msg).cyan());
}

pub fn print_spoken(path: &str) {
    println!("{} {}", SPEAKER, style(format!("Saved audio to {}", path)).dim());
}

pub fn print_banner() {
    println!();
    println!(
        "{}",
        style("briefly · quotes, weather, headlines and your to-do list")
            .bold()
            .cyan()
    );
    println!();
}

pub fn print_goodbye() {
    println!("\n{} {}", SPARKLE, style("Bye!").bold().cyan());
}

enum GuideLine {
    Command(String, String),
    Status(String, String),
    Text(String),
    Hint(String),
    Blank,
}

/// A titled block of help text printed in one go.
pub struct GuideSection {
    title: String,
    lines: Vec<GuideLine>,
}

impl GuideSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn command(mut self, name: &str, description: &str) -> Self {
        self.lines
            .push(GuideLine::Command(name.to_string(), description.to_string()));
        self
    }

    pub fn status(mut self, label: &str, value: &str) -> Self {
        self.lines
            .push(GuideLine::Status(label.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.lines.push(GuideLine::Text(text.to_string()));
        self
    }

    pub fn hint(mut self, example: &str) -> Self {
        self.lines.push(GuideLine::Hint(example.to_string()));
        self
    }

    pub fn blank(mut self) -> Self {
        self.lines.push(GuideLine::Blank);
        self
    }

    pub fn print(self) {
        println!("\n {}", style(&self.title).bold().underlined());
        for line in self.lines {
            match line {
                GuideLine::Command(name, description) => {
                    println!("   {:<12} {}", style(name).green(), description)
                }
                GuideLine::Status(label, value) => print_status(&label, &value),
                GuideLine::Text(text) => println!("   {}", text),
                GuideLine::Hint(example) => println!("   {} {}", style("$").dim(), style(example).cyan()),
                GuideLine::Blank => println!(),
            }
        }
    }
}

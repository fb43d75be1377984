//! REPL command grammar.

use std::path::PathBuf;
use std::str::FromStr;

use studio_core::model::{ItemType, SubjectCategory};
use studio_core::viewer::ViewMode;

/// Words offered for completion, in the order shown by `help`.
pub const COMMAND_WORDS: &[&str] = &[
    "help",
    "status",
    "category",
    "subjects",
    "items",
    "subject",
    "item",
    "upload",
    "delete",
    "design",
    "next",
    "back",
    "reset",
    "generate",
    "turnaround",
    "history",
    "view",
    "zoom",
    "tilt",
    "scrub",
    "save",
    "quit",
];

/// Which library a command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Subject,
    Item,
}

/// How a listed image is addressed: 1-based position or stable id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    Index(usize),
    Id(String),
}

impl FromStr for Pick {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<usize>() {
            Ok(0) => Err("Positions start at 1".to_string()),
            Ok(n) => Ok(Pick::Index(n)),
            Err(_) if !s.is_empty() => Ok(Pick::Id(s.to_string())),
            Err(_) => Err("Missing image position or id".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Status,
    Category(SubjectCategory),
    ListSubjects,
    ListItems(Option<ItemType>),
    Select(Target, Pick),
    Upload(Target, PathBuf),
    Delete(Target, Vec<Pick>),
    Design(String),
    Next,
    Back,
    Reset,
    Generate,
    Turnaround,
    History,
    HistoryLoad(usize),
    HistoryDelete(Vec<usize>),
    View(ViewMode),
    ZoomIn,
    ZoomOut,
    Tilt(f32, f32),
    Scrub(f32),
    Save(PathBuf),
    Quit,
}

fn target(word: Option<&str>) -> Result<Target, String> {
    match word {
        Some("subject") | Some("subjects") => Ok(Target::Subject),
        Some("item") | Some("items") => Ok(Target::Item),
        _ => Err("Expected 'subject' or 'item'".to_string()),
    }
}

fn positions(words: &[&str]) -> Result<Vec<usize>, String> {
    if words.is_empty() {
        return Err("Expected at least one position".to_string());
    }
    words
        .iter()
        .map(|word| match word.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("Invalid position '{}'", word)),
        })
        .collect()
}

fn number(word: Option<&str>, name: &str) -> Result<f32, String> {
    word.and_then(|w| w.parse::<f32>().ok())
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("Expected a number for {}", name))
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&head, rest)) = words.split_first() else {
            return Err("Empty command".to_string());
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "status" => Command::Status,
            "category" => {
                let name = rest.first().ok_or("Expected person, animal or object")?;
                Command::Category(
                    SubjectCategory::from_str(name)
                        .map_err(|_| format!("Unknown category '{}'", name))?,
                )
            }
            "subjects" => Command::ListSubjects,
            "items" => match rest.first() {
                None => Command::ListItems(None),
                Some(name) => Command::ListItems(Some(
                    ItemType::from_str(name).map_err(|_| format!("Unknown item type '{}'", name))?,
                )),
            },
            "subject" => Command::Select(Target::Subject, rest.first().copied().unwrap_or("").parse()?),
            "item" => Command::Select(Target::Item, rest.first().copied().unwrap_or("").parse()?),
            "upload" => {
                let target = target(rest.first().copied())?;
                let path = rest.get(1..).map(|parts| parts.join(" ")).unwrap_or_default();
                if path.is_empty() {
                    return Err("Expected a file path".to_string());
                }
                Command::Upload(target, PathBuf::from(path))
            }
            "delete" => {
                let target = target(rest.first().copied())?;
                let picks = rest[1..]
                    .iter()
                    .map(|word| word.parse())
                    .collect::<Result<Vec<Pick>, _>>()?;
                if picks.is_empty() {
                    return Err("Expected at least one position or id".to_string());
                }
                Command::Delete(target, picks)
            }
            "design" => {
                let description = rest.join(" ");
                if description.is_empty() {
                    return Err("Describe the item to design".to_string());
                }
                Command::Design(description)
            }
            "next" => Command::Next,
            "back" => Command::Back,
            "reset" => Command::Reset,
            "generate" | "regenerate" => Command::Generate,
            "turnaround" => Command::Turnaround,
            "history" => match rest.split_first() {
                None => Command::History,
                Some((&"load", args)) => {
                    let position = positions(args)?;
                    Command::HistoryLoad(position[0])
                }
                Some((&"delete", args)) => Command::HistoryDelete(positions(args)?),
                Some((other, _)) => return Err(format!("Unknown history action '{}'", other)),
            },
            "view" => match rest.first().copied() {
                Some("flat") => Command::View(ViewMode::Flat),
                Some("tilt") | Some("3d") => Command::View(ViewMode::TiltCard),
                Some("turnaround") | Some("360") => Command::View(ViewMode::Turnaround),
                _ => return Err("Expected flat, tilt or turnaround".to_string()),
            },
            "zoom" => match rest.first().copied() {
                Some("in") | Some("+") => Command::ZoomIn,
                Some("out") | Some("-") => Command::ZoomOut,
                _ => return Err("Expected 'in' or 'out'".to_string()),
            },
            "tilt" => Command::Tilt(
                number(rest.first().copied(), "dx")?,
                number(rest.get(1).copied(), "dy")?,
            ),
            "scrub" => {
                let percent = number(rest.first().copied(), "percent")?;
                Command::Scrub(percent)
            }
            "save" => {
                let path = rest.join(" ");
                if path.is_empty() {
                    return Err("Expected a file path".to_string());
                }
                Command::Save(PathBuf::from(path))
            }
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
        };
        Ok(command)
    }
}

pub const HELP: &str = "\
Selection
  category <person|animal|object>   Switch subject category
  subjects                          List subjects of the current category
  items [clothing|accessory]        List items (and switch item tab)
  subject <n|id>                    Select a subject
  item <n|id>                       Select an item from the current tab
  upload subject|item <path>        Add a local image to the library
  delete subject|item <n|id>...     Remove custom images
  design <description>              Generate a new item for the current tab
Wizard
  next / back / reset               Move between steps
  generate                          Generate (or regenerate) the result
  turnaround                        Generate front/side/back views
  history [load <n> | delete <n>...]
Viewer
  view <flat|tilt|turnaround>       Change view mode
  zoom <in|out>, tilt <dx> <dy>, scrub <percent>
  save <path>                       Write the current result to a file
  status, help, quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Exit,
    NewSession,
    Health,
    Transcript,
    Submit(&'a str),
    Empty,
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            "" => Self::Empty,
            "exit" | "quit" | "/exit" | "/quit" => Self::Exit,
            "/new" => Self::NewSession,
            "/health" => Self::Health,
            "/history" => Self::Transcript,
            _ => Self::Submit(trimmed),
        }
    }
}

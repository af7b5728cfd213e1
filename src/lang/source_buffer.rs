
use std::{ collections::VecDeque,
           fmt::{ self,
                  Display,
                  Formatter },
           fs::read_to_string,
           io::{ self, stdin, BufRead } };



/// The location of a line of source text.  Used by the error reporting to tell the user which line
/// of which file was being processed when something went wrong.
///
/// This is a read-only structure.  Use the field accessor methods to get the values.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SourceLocation
{
    /// Either the path to the file or a description of the source code.  For example code entered
    /// at the terminal will have a tag of "\<stdin\>".
    path: String,

    /// The 1 based line number of the line being processed.
    line: usize
}


/// Used for error reporting to show where in the source code an error originated.
impl Display for SourceLocation
{
    fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), fmt::Error>
    {
        write!(formatter, "{} ({})", self.path, self.line)
    }
}


impl SourceLocation
{
    /// Create a new SourceLocation with the path to, or a tag for, the source code.
    pub fn new_from_path(path: &str) -> Self
    {
        SourceLocation { path: path.to_owned(), line: 0 }
    }

    /// Create a new SourceLocation with all of the needed information.
    pub fn new_from_info(path: &str, line: usize) -> Self
    {
        SourceLocation { path: path.to_owned(), line }
    }

    /// The path to the source code or a meaningful description of the source code.
    pub fn path(&self) -> &String
    {
        &self.path
    }

    /// The 1 based line number in the source code.
    pub fn line(&self) -> usize
    {
        self.line
    }
}



/// Somewhere the outer interpreter can pull whole lines of source text from.  Every time the input
/// buffer runs dry the interpreter asks its line source for one more line.
pub trait LineSource
{
    /// Read the next line without its line terminator.  `None` signals the end of the input.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Where the most recently read line came from.
    fn location(&self) -> SourceLocation;

    /// Is a person typing at the other end?  Interactive sources get an `ok` prompt.
    fn is_interactive(&self) -> bool
    {
        false
    }
}



/// Lines typed by the user on the process's standard input.
pub struct StdinLines
{
    location: SourceLocation
}


impl StdinLines
{
    pub fn new() -> Self
    {
        StdinLines { location: SourceLocation::new_from_path("<stdin>") }
    }
}


impl Default for StdinLines
{
    fn default() -> Self
    {
        Self::new()
    }
}


impl LineSource for StdinLines
{
    fn read_line(&mut self) -> io::Result<Option<String>>
    {
        let mut line = String::new();

        if stdin().lock().read_line(&mut line)? == 0
        {
            return Ok(None);
        }

        self.location.line += 1;

        Ok(Some(strip_terminator(line)))
    }

    fn location(&self) -> SourceLocation
    {
        self.location.clone()
    }

    fn is_interactive(&self) -> bool
    {
        true
    }
}



/// A script held in memory.  Either loaded from a file or handed over as a string by an embedding
/// program.
pub struct ScriptLines
{
    lines: VecDeque<String>,
    location: SourceLocation
}


impl ScriptLines
{
    /// Split some source text into lines, tagging them with the given path for error reporting.
    pub fn from_source(path: &str, source: &str) -> Self
    {
        ScriptLines
            {
                lines: source.lines().map(|line| line.to_string()).collect(),
                location: SourceLocation::new_from_path(path)
            }
    }

    /// Read a whole script file into memory.
    pub fn from_file(path: &str) -> io::Result<Self>
    {
        let source = read_to_string(path)?;

        Ok(ScriptLines::from_source(path, &source))
    }

    /// How many lines have yet to be read?
    pub fn remaining(&self) -> usize
    {
        self.lines.len()
    }
}


impl LineSource for ScriptLines
{
    fn read_line(&mut self) -> io::Result<Option<String>>
    {
        let line = self.lines.pop_front();

        if line.is_some()
        {
            self.location.line += 1;
        }

        Ok(line)
    }

    fn location(&self) -> SourceLocation
    {
        self.location.clone()
    }
}



fn strip_terminator(mut line: String) -> String
{
    while line.ends_with('\n') || line.ends_with('\r')
    {
        line.pop();
    }

    line
}



#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn script_lines_track_line_numbers()
    {
        let mut source = ScriptLines::from_source("demo.f", ": A 1 ;\n: B 2 ;\n");

        assert_eq!(source.read_line().unwrap(), Some(": A 1 ;".to_string()));
        assert_eq!(source.read_line().unwrap(), Some(": B 2 ;".to_string()));
        assert_eq!(source.location().to_string(), "demo.f (2)");
        assert_eq!(source.read_line().unwrap(), None);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn terminators_are_removed()
    {
        assert_eq!(strip_terminator("DUP\r\n".to_string()), "DUP");
    }
}

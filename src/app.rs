//! Console menu and non-interactive commands on top of the repository.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{bail, Context, Result};
use crossterm::style::{StyledContent, Stylize};

use crate::cli::{AppConfig, Commands};
use crate::data::{ensure_schema, ConnectionProvider, Decimal, Project, ProjectRepository, SqliteProvider};

const OPERATIONS: [&str; 5] = [
    "1) Add a project",
    "2) List projects",
    "3) Select a project",
    "4) Update project details",
    "5) Delete a project",
];

/// Interactive menu state
pub struct App<P, R, W> {
    repo: ProjectRepository<P>,
    input: R,
    output: W,
    /// Project the user is working with
    current: Option<Project>,
    /// Emit ANSI styling; off unless the output is a terminal
    styled: bool,
}

impl<P: ConnectionProvider, R: BufRead, W: Write> App<P, R, W> {
    pub fn new(repo: ProjectRepository<P>, input: R, output: W) -> Self {
        App {
            repo,
            input,
            output,
            current: None,
            styled: false,
        }
    }

    pub fn with_styling(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    /// Loop until the user submits a blank selection or input ends.
    /// Failures of a single selection are printed and the loop continues.
    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.process_selection() {
                Ok(true) => break,
                Ok(false) => {}
                Err(err) => {
                    tracing::debug!(error = ?err, "menu selection failed");
                    let label = self.paint("Error:".red().bold());
                    writeln!(self.output, "\n{label} {err:#}\n")?;
                }
            }
        }
        Ok(())
    }

    /// Returns true when the user asked to quit
    fn process_selection(&mut self) -> Result<bool> {
        self.print_operations()?;
        let Some(selection) = self.get_int_input::<i64>("Enter a menu selection")? else {
            writeln!(self.output, "Exiting menu.")?;
            return Ok(true);
        };

        match selection {
            1 => self.create_project()?,
            2 => self.list_projects()?,
            3 => self.select_project()?,
            4 => self.update_project_details()?,
            5 => self.delete_project()?,
            other => writeln!(self.output, "\n{other} is not a valid selection. Try again.\n")?,
        }
        Ok(false)
    }

    fn create_project(&mut self) -> Result<()> {
        let Some(project_name) = self.get_string_input("Enter the project name")? else {
            bail!("a project name is required");
        };
        let project = Project {
            estimated_hours: self.get_decimal_input("Enter the estimated hours")?,
            actual_hours: self.get_decimal_input("Enter the actual hours")?,
            difficulty: self.get_int_input("Enter the project difficulty (1-5)")?,
            notes: self.get_string_input("Enter the project notes")?,
            ..Project::new(project_name)
        };

        let db_project = self.repo.insert(project).context("could not add the project")?;
        writeln!(self.output, "You have successfully created project: {db_project}")?;
        Ok(())
    }

    fn list_projects(&mut self) -> Result<()> {
        let projects = self.repo.fetch_all().context("could not list projects")?;
        let heading = self.paint("Projects:".bold());
        writeln!(self.output, "\n{heading}")?;
        for project in projects {
            writeln!(
                self.output,
                "  {}: {}",
                project.project_id.unwrap_or_default(),
                project.project_name
            )?;
        }
        Ok(())
    }

    fn select_project(&mut self) -> Result<()> {
        self.list_projects()?;
        let project_id = self.require_project_id("Enter a project ID to select a project")?;

        self.current = None;
        self.current = self
            .repo
            .fetch_by_id(project_id)
            .context("could not load the project")?;

        if self.current.is_none() {
            writeln!(self.output, "Invalid project ID selected.")?;
        }
        Ok(())
    }

    fn update_project_details(&mut self) -> Result<()> {
        let Some(current) = self.current.clone() else {
            writeln!(self.output, "\nPlease select a project.")?;
            return Ok(());
        };

        let project_name = self.get_string_input(&format!(
            "Enter the project name [{}]",
            current.project_name
        ))?;
        let estimated_hours = self.get_decimal_input(&format!(
            "Enter the estimated hours [{}]",
            display_or_blank(&current.estimated_hours)
        ))?;
        let actual_hours = self.get_decimal_input(&format!(
            "Enter the actual hours [{}]",
            display_or_blank(&current.actual_hours)
        ))?;
        let difficulty = self.get_int_input(&format!(
            "Enter the project difficulty (1-5) [{}]",
            display_or_blank(&current.difficulty)
        ))?;
        let notes = self.get_string_input(&format!(
            "Enter the project notes [{}]",
            display_or_blank(&current.notes)
        ))?;

        // Blank answers keep the current value
        let project = Project {
            project_id: current.project_id,
            project_name: project_name.unwrap_or(current.project_name),
            estimated_hours: estimated_hours.or(current.estimated_hours),
            actual_hours: actual_hours.or(current.actual_hours),
            difficulty: difficulty.or(current.difficulty),
            notes: notes.or(current.notes),
            ..Default::default()
        };

        let project_id = project.project_id.unwrap_or_default();
        if !self.repo.update(&project).context("could not update the project")? {
            writeln!(self.output, "Project {project_id} was not updated.")?;
        }
        self.current = self
            .repo
            .fetch_by_id(project_id)
            .context("could not reload the project")?;
        Ok(())
    }

    fn delete_project(&mut self) -> Result<()> {
        self.list_projects()?;
        let project_id = self.require_project_id("Enter the ID of the project to delete")?;

        if self.repo.delete(project_id).context("could not delete the project")? {
            writeln!(self.output, "Project {project_id} was deleted successfully!")?;
        } else {
            writeln!(self.output, "Project {project_id} does not exist.")?;
        }

        if self
            .current
            .as_ref()
            .is_some_and(|p| p.project_id == Some(project_id))
        {
            self.current = None;
        }
        Ok(())
    }

    fn print_operations(&mut self) -> Result<()> {
        let heading = self.paint("These are the available selections. Press the Enter key to quit:".bold());
        writeln!(self.output, "\n{heading}")?;
        for line in OPERATIONS {
            writeln!(self.output, "   {line}")?;
        }

        match &self.current {
            None => writeln!(self.output, "\nYou are not working with a project")?,
            Some(project) => writeln!(self.output, "\nYou are working with project: {project}")?,
        }
        Ok(())
    }

    fn paint(&self, content: StyledContent<&str>) -> String {
        if self.styled {
            content.to_string()
        } else {
            content.content().to_string()
        }
    }

    fn require_project_id(&mut self, prompt: &str) -> Result<i64> {
        match self.get_int_input(prompt)? {
            Some(id) => Ok(id),
            None => bail!("a project ID is required"),
        }
    }

    fn get_decimal_input(&mut self, prompt: &str) -> Result<Option<Decimal>> {
        let Some(input) = self.get_string_input(prompt)? else {
            return Ok(None);
        };
        Ok(Some(input.parse()?))
    }

    fn get_int_input<T: std::str::FromStr>(&mut self, prompt: &str) -> Result<Option<T>> {
        let Some(input) = self.get_string_input(prompt)? else {
            return Ok(None);
        };
        match input.parse() {
            Ok(value) => Ok(Some(value)),
            Err(_) => bail!("{input} is not a valid number. Try again."),
        }
    }

    /// Blank input and end of input both read as `None`
    fn get_string_input(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line).context("failed to read input")?;
        let trimmed = line.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }
}

fn display_or_blank<T: std::fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Open the database from `config` and run the requested command
pub fn run(config: AppConfig) -> Result<()> {
    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {parent:?}"))?;
    }

    let provider = SqliteProvider::new(config.db_path.clone(), config.busy_timeout);
    {
        let conn = provider
            .acquire()
            .with_context(|| format!("Failed to open database: {:?}", provider.db_path()))?;
        ensure_schema(&conn).context("Failed to create the database schema")?;
    }
    tracing::debug!(path = ?config.db_path, "database ready");

    let repo = ProjectRepository::new(provider);
    let stdout = io::stdout();
    match config.command {
        Commands::Menu => {
            let styled = stdout.is_terminal();
            App::new(repo, io::stdin().lock(), stdout.lock())
                .with_styling(styled)
                .run()
        }
        Commands::List { json } => list(&repo, &mut stdout.lock(), json),
        Commands::Show { id, json } => show(&repo, &mut stdout.lock(), id, json),
    }
}

fn list<P: ConnectionProvider>(repo: &ProjectRepository<P>, out: &mut impl Write, json: bool) -> Result<()> {
    let projects = repo.fetch_all()?;
    if json {
        serde_json::to_writer_pretty(&mut *out, &projects)?;
        writeln!(out)?;
    } else {
        for project in projects {
            writeln!(out, "{}: {}", project.project_id.unwrap_or_default(), project.project_name)?;
        }
    }
    Ok(())
}

fn show<P: ConnectionProvider>(
    repo: &ProjectRepository<P>,
    out: &mut impl Write,
    project_id: i64,
    json: bool,
) -> Result<()> {
    let Some(project) = repo.fetch_by_id(project_id)? else {
        bail!("Project {project_id} does not exist");
    };
    if json {
        serde_json::to_writer_pretty(&mut *out, &project)?;
        writeln!(out)?;
    } else {
        write!(out, "{project}")?;
    }
    Ok(())
}

//! The interface a front end (such as an editor pane) uses.
//!
//! An [`Assembler`] holds the session of the most recent assembly,
//! and the memory image into which programs are loaded.
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use tracing::{event, Level};

use base::prelude::{Address, MemoryError, MemoryImage};

use super::driver::{assemble, AssemblyOptions, AssemblySession, ProgramKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    NothingAssembled,
    AssemblyFailed,
    /// Operating systems are installed, not loaded.
    NotAUserProgram,
    Memory(MemoryError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NothingAssembled => f.write_str("no program has been assembled"),
            LoadError::AssemblyFailed => {
                f.write_str("the program has errors and cannot be loaded")
            }
            LoadError::NotAUserProgram => {
                f.write_str("an operating system must be installed rather than loaded")
            }
            LoadError::Memory(e) => write!(f, "cannot load program: {e}"),
        }
    }
}

impl Error for LoadError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallError {
    NothingAssembled,
    AssemblyFailed,
    NotAnOperatingSystem,
    /// The operating system has no `.BURN`, or generated no code.
    NoRomImage,
    /// The startup installation has already been attempted.
    AlreadyStarted,
    /// A user program already occupies memory.
    UserProgramLoaded,
    Memory(MemoryError),
}

impl Display for InstallError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            InstallError::NothingAssembled => {
                f.write_str("no operating system has been assembled")
            }
            InstallError::AssemblyFailed => {
                f.write_str("the operating system has errors and was not installed")
            }
            InstallError::NotAnOperatingSystem => {
                f.write_str("the program was not assembled as an operating system")
            }
            InstallError::NoRomImage => {
                f.write_str("the operating system has no code to burn into ROM")
            }
            InstallError::AlreadyStarted => {
                f.write_str("the operating system can only be installed once at startup")
            }
            InstallError::UserProgramLoaded => f.write_str(
                "the operating system cannot be installed after a user program is loaded",
            ),
            InstallError::Memory(e) => write!(f, "cannot install operating system: {e}"),
        }
    }
}

impl Error for InstallError {}

#[derive(Debug, Default)]
pub struct Assembler {
    session: Option<AssemblySession>,
    memory: MemoryImage,
    startup_attempted: bool,
}

impl Assembler {
    pub fn new() -> Assembler {
        Assembler::default()
    }

    /// Assemble `source`, replacing the previous session.  Returns
    /// true if there were no errors.
    pub fn assemble(&mut self, source: &str, options: &AssemblyOptions) -> bool {
        let session = assemble(source, options);
        let succeeded = session.succeeded();
        self.session = Some(session);
        succeeded
    }

    pub fn session(&self) -> Option<&AssemblySession> {
        self.session.as_ref()
    }

    pub fn memory(&self) -> &MemoryImage {
        &self.memory
    }

    pub fn object_code(&self) -> Vec<u8> {
        self.session
            .as_ref()
            .map(|s| s.object_code().to_vec())
            .unwrap_or_default()
    }

    pub fn assembler_listing_list(&self) -> Vec<String> {
        self.session
            .as_ref()
            .map(AssemblySession::assembler_listing_list)
            .unwrap_or_default()
    }

    pub fn listing_trace_list(&self) -> Vec<String> {
        self.session
            .as_ref()
            .map(AssemblySession::listing_trace_list)
            .unwrap_or_default()
    }

    pub fn has_check_box(&self) -> Vec<bool> {
        self.session
            .as_ref()
            .map(AssemblySession::has_check_box)
            .unwrap_or_default()
    }

    pub fn adjust_code_list(&mut self, delta: i32) {
        if let Some(session) = self.session.as_mut() {
            session.adjust_code_list(delta);
        }
    }

    pub fn remove_error_messages(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.remove_error_messages();
        }
    }

    /// Copy the current user program into memory at its start
    /// address.
    ///
    /// # Errors
    ///
    /// There is no successfully assembled user program, or it does
    /// not fit below the operating system.
    pub fn load(&mut self) -> Result<Address, LoadError> {
        let session = self.session.as_ref().ok_or(LoadError::NothingAssembled)?;
        if !session.succeeded() {
            return Err(LoadError::AssemblyFailed);
        }
        if session.options().kind != ProgramKind::User {
            return Err(LoadError::NotAUserProgram);
        }
        let start = session.start_address().unwrap_or_default();
        self.memory
            .load(start, session.object_code())
            .map_err(LoadError::Memory)?;
        event!(
            Level::INFO,
            "loaded {} bytes at {start}",
            session.object_code().len()
        );
        Ok(start)
    }

    /// Copy the current operating system into ROM.  Returns the ROM
    /// start address.
    ///
    /// # Errors
    ///
    /// The current session is not a successfully assembled operating
    /// system with a `.BURN`.
    pub fn install_os(&mut self) -> Result<Address, InstallError> {
        let session = self
            .session
            .as_ref()
            .ok_or(InstallError::NothingAssembled)?;
        if !session.succeeded() {
            return Err(InstallError::AssemblyFailed);
        }
        if session.options().kind != ProgramKind::OperatingSystem {
            return Err(InstallError::NotAnOperatingSystem);
        }
        let rom_start = match session.rom_start() {
            Some(addr) if !session.object_code().is_empty() => addr,
            _ => return Err(InstallError::NoRomImage),
        };
        self.memory
            .install_rom(rom_start, session.object_code())
            .map_err(InstallError::Memory)?;
        event!(
            Level::INFO,
            "installed {} bytes of operating system at {rom_start}",
            session.object_code().len()
        );
        Ok(rom_start)
    }

    /// Assemble and install the operating system.  This may only be
    /// attempted once, before any user program is loaded.  If
    /// assembly fails nothing is installed.
    ///
    /// # Errors
    ///
    /// See [`InstallError`].
    pub fn install_os_on_startup(&mut self, source: &str) -> Result<Address, InstallError> {
        if self.startup_attempted {
            return Err(InstallError::AlreadyStarted);
        }
        self.startup_attempted = true;
        if self.memory.user_program().is_some() {
            return Err(InstallError::UserProgramLoaded);
        }
        if !self.assemble(source, &AssemblyOptions::operating_system()) {
            event!(
                Level::ERROR,
                "operating system failed to assemble; nothing installed"
            );
            return Err(InstallError::AssemblyFailed);
        }
        self.install_os()
    }
}

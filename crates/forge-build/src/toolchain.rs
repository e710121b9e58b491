//! Closed table of supported C/C++ toolchains and their command shapes.

use forge_core::config::BuildConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toolchain {
    Gcc,
    Clang,
    Msvc,
}

/// Flag syntax a toolchain speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// `-std=`, `-I`, `-o`
    Gnu,
    /// `/std:`, `/I`, `/Fe`
    Msvc,
}

/// Static description of one toolchain.
#[derive(Debug)]
pub struct ToolchainSpec {
    pub toolchain: Toolchain,
    pub c_driver: &'static str,
    pub cpp_driver: &'static str,
    pub warning_flags: &'static [&'static str],
    pub family: Family,
}

const TOOLCHAINS: [ToolchainSpec; 3] = [
    ToolchainSpec {
        toolchain: Toolchain::Gcc,
        c_driver: "gcc",
        cpp_driver: "g++",
        warning_flags: &["-Wall", "-Wextra", "-pedantic"],
        family: Family::Gnu,
    },
    ToolchainSpec {
        toolchain: Toolchain::Clang,
        c_driver: "clang",
        cpp_driver: "clang++",
        warning_flags: &["-Wall", "-Wextra", "-Wpedantic"],
        family: Family::Gnu,
    },
    ToolchainSpec {
        toolchain: Toolchain::Msvc,
        c_driver: "cl.exe",
        cpp_driver: "cl.exe",
        warning_flags: &["/W4", "/EHsc", "/nologo"],
        family: Family::Msvc,
    },
];

const CPP_EXTENSIONS: &[&str] = &["cpp", "cc", "cxx", "c++"];

/// True if any source is C++ (decides between the C and C++ driver).
pub fn is_cpp_sources(sources: &[PathBuf]) -> bool {
    sources.iter().any(|s| {
        s.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| CPP_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
    })
}

/// An assembled process invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for CompileCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

impl Toolchain {
    pub fn spec(self) -> &'static ToolchainSpec {
        match self {
            Self::Gcc => &TOOLCHAINS[0],
            Self::Clang => &TOOLCHAINS[1],
            Self::Msvc => &TOOLCHAINS[2],
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Gcc => "gcc",
            Self::Clang => "clang",
            Self::Msvc => "msvc",
        }
    }

    fn driver(self, cpp: bool) -> &'static str {
        let spec = self.spec();
        if cpp { spec.cpp_driver } else { spec.c_driver }
    }

    /// Path of the executable the linker actually writes for `output`.
    pub fn executable_path(self, output: &Path) -> PathBuf {
        match self.spec().family {
            Family::Msvc if output.extension().is_none_or(|e| e != "exe") => {
                let mut name = output.as_os_str().to_owned();
                name.push(".exe");
                PathBuf::from(name)
            }
            _ => output.to_path_buf(),
        }
    }

    /// Command that compiles and links `sources` into `output`.
    pub fn compile_command(
        self,
        sources: &[PathBuf],
        include_dirs: &[PathBuf],
        output: &Path,
        config: &BuildConfig,
    ) -> CompileCommand {
        let cpp = is_cpp_sources(sources);
        let spec = self.spec();
        let mut args: Vec<String> = spec.warning_flags.iter().map(|f| (*f).to_string()).collect();
        let includes = include_dirs.iter().chain(&config.extra_include_dirs);

        match spec.family {
            Family::Gnu => {
                let std = if cpp { &config.cpp_standard } else { &config.c_standard };
                args.push(format!("-std={std}"));
                args.extend(includes.map(|dir| format!("-I{}", dir.display())));
                args.extend(sources.iter().map(|s| s.display().to_string()));
                args.push("-o".to_string());
                args.push(output.display().to_string());
            }
            Family::Msvc => {
                args.push(if cpp { "/std:c++latest" } else { "/std:c11" }.to_string());
                args.extend(includes.map(|dir| format!("/I{}", dir.display())));
                args.extend(sources.iter().map(|s| s.display().to_string()));
                args.push(format!("/Fe{}", output.display()));
                args.extend(["/link", "kernel32.lib", "user32.lib"].map(String::from));
            }
        }

        CompileCommand {
            program: self.driver(cpp).to_string(),
            args,
        }
    }

    /// Command that builds a googletest binary from `sources`.
    ///
    /// Always uses the C++ driver; gtest paths come from the build config.
    pub fn test_command(
        self,
        sources: &[PathBuf],
        include_dirs: &[PathBuf],
        output: &Path,
        config: &BuildConfig,
    ) -> CompileCommand {
        let spec = self.spec();
        let mut args: Vec<String> = spec.warning_flags.iter().map(|f| (*f).to_string()).collect();
        let includes = config
            .gtest_include
            .iter()
            .chain(include_dirs)
            .chain(&config.extra_include_dirs);

        match spec.family {
            Family::Gnu => {
                args.push(format!("-std={}", config.cpp_standard));
                args.extend(includes.map(|dir| format!("-I{}", dir.display())));
                args.extend(sources.iter().map(|s| s.display().to_string()));
                args.push("-o".to_string());
                args.push(output.display().to_string());
                if let Some(lib) = &config.gtest_lib {
                    args.push(format!("-L{}", lib.display()));
                }
                args.extend(["-lgtest", "-lgtest_main", "-pthread"].map(String::from));
            }
            Family::Msvc => {
                args.push("/MT".to_string());
                args.push("/std:c++latest".to_string());
                args.extend(includes.map(|dir| format!("/I{}", dir.display())));
                args.extend(sources.iter().map(|s| s.display().to_string()));
                args.push(format!("/Fe{}", output.display()));
                args.push("/link".to_string());
                if let Some(lib) = &config.gtest_lib {
                    args.push(format!("/LIBPATH:{}", lib.display()));
                }
                args.extend(["gtest.lib", "gtest_main.lib"].map(String::from));
            }
        }

        CompileCommand {
            program: self.driver(true).to_string(),
            args,
        }
    }
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Toolchain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gcc" | "g++" | "gnu" => Ok(Self::Gcc),
            "clang" | "clang++" => Ok(Self::Clang),
            "msvc" | "cl" | "cl.exe" => Ok(Self::Msvc),
            other => Err(format!("unknown toolchain: '{other}' (expected auto, gcc, clang or msvc)")),
        }
    }
}

/// Configured toolchain: a fixed one or `auto`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ToolchainChoice {
    #[default]
    Auto,
    Explicit(Toolchain),
}

impl FromStr for ToolchainChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            s.parse().map(Self::Explicit)
        }
    }
}

impl ToolchainChoice {
    /// Resolve `auto` against the host: Clang first, then GCC (or MSVC on
    /// Windows), whichever has its driver available; the platform default if
    /// none is.
    pub fn resolve(self, is_available: impl Fn(&str) -> bool) -> Toolchain {
        self.resolve_for(cfg!(windows), is_available)
    }

    pub fn resolve_for(self, windows: bool, is_available: impl Fn(&str) -> bool) -> Toolchain {
        match self {
            Self::Explicit(toolchain) => toolchain,
            Self::Auto => {
                let fallback = if windows { Toolchain::Msvc } else { Toolchain::Gcc };
                [Toolchain::Clang, fallback]
                    .into_iter()
                    .find(|t| is_available(t.spec().cpp_driver))
                    .unwrap_or(fallback)
            }
        }
    }
}

/// Locate `program` in the directories on `PATH`.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) && Path::new(program).extension().is_none() {
            let exe = dir.join(format!("{program}.exe"));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

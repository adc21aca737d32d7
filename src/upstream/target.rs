use crate::error::{Result, WrapperError};

/// Interpreter used to run a local server script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpreter {
    Deno,
    Node,
    Python,
}

impl Interpreter {
    fn for_path(path: &str) -> Option<Self> {
        if path.ends_with(".ts") {
            Some(Interpreter::Deno)
        } else if path.ends_with(".js") || path.ends_with(".mjs") {
            Some(Interpreter::Node)
        } else if path.ends_with(".py") {
            Some(Interpreter::Python)
        } else {
            None
        }
    }
}

/// Package registry named by a target's scheme prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageRegistry {
    Npm,
    Jsr,
    PyPi,
}

impl PackageRegistry {
    const SCHEMES: [(&'static str, PackageRegistry); 3] = [
        ("npm:", PackageRegistry::Npm),
        ("jsr:", PackageRegistry::Jsr),
        ("pypi:", PackageRegistry::PyPi),
    ];
}

/// How the upstream MCP server is reached, derived from the target string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamTarget {
    /// Local source file run through an interpreter
    Script {
        path: String,
        interpreter: Interpreter,
    },
    /// Local program executed directly
    Executable { path: String },
    /// Published package run through its registry's runner
    Package {
        registry: PackageRegistry,
        name: String,
    },
    /// Streamable HTTP endpoint
    Remote { url: String },
    /// Anything else; only usable through a module loader
    Module { name: String },
}

/// Program and arguments used to spawn an upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchCommand {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

fn is_local_path(target: &str) -> bool {
    target.starts_with("./") || target.starts_with("../") || target.starts_with('/')
}

impl UpstreamTarget {
    /// Classify a target string by its prefix and suffix
    pub fn parse(target: &str) -> Result<Self> {
        let target = target.trim();
        if target.is_empty() {
            return Err(WrapperError::UnsupportedTarget(
                "empty upstream target".to_string(),
            ));
        }

        if target.starts_with("http://") || target.starts_with("https://") {
            return Ok(UpstreamTarget::Remote {
                url: target.to_string(),
            });
        }

        for (scheme, registry) in PackageRegistry::SCHEMES {
            if let Some(name) = target.strip_prefix(scheme) {
                if name.is_empty() {
                    return Err(WrapperError::UnsupportedTarget(format!(
                        "package reference '{}' has no package name",
                        target
                    )));
                }
                return Ok(UpstreamTarget::Package {
                    registry,
                    name: name.to_string(),
                });
            }
        }

        if is_local_path(target) {
            return Ok(match Interpreter::for_path(target) {
                Some(interpreter) => UpstreamTarget::Script {
                    path: target.to_string(),
                    interpreter,
                },
                None => UpstreamTarget::Executable {
                    path: target.to_string(),
                },
            });
        }

        Ok(UpstreamTarget::Module {
            name: target.to_string(),
        })
    }

    /// Command that spawns this upstream, if it runs as a child process
    pub fn launch_command(&self) -> Option<LaunchCommand> {
        match self {
            UpstreamTarget::Script { path, interpreter } => Some(match interpreter {
                Interpreter::Deno => LaunchCommand::new(
                    "deno",
                    &[
                        "run",
                        "--allow-read",
                        "--allow-write",
                        "--allow-run",
                        "--allow-net",
                        path.as_str(),
                    ],
                ),
                Interpreter::Node => LaunchCommand::new("node", &[path.as_str()]),
                Interpreter::Python => LaunchCommand::new("python3", &[path.as_str()]),
            }),
            UpstreamTarget::Executable { path } => Some(LaunchCommand::new(path, &[])),
            UpstreamTarget::Package { registry, name } => Some(match registry {
                PackageRegistry::Npm => LaunchCommand::new("npx", &["-y", name.as_str()]),
                PackageRegistry::Jsr => {
                    let specifier = format!("jsr:{}", name);
                    LaunchCommand::new("deno", &["run", "-A", specifier.as_str()])
                }
                PackageRegistry::PyPi => LaunchCommand::new("uvx", &[name.as_str()]),
            }),
            UpstreamTarget::Remote { .. } | UpstreamTarget::Module { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamTarget::Script { .. } => "script",
            UpstreamTarget::Executable { .. } => "executable",
            UpstreamTarget::Package { .. } => "package",
            UpstreamTarget::Remote { .. } => "remote",
            UpstreamTarget::Module { .. } => "module",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_scripts() {
        assert_eq!(
            UpstreamTarget::parse("./test-server.ts").unwrap(),
            UpstreamTarget::Script {
                path: "./test-server.ts".to_string(),
                interpreter: Interpreter::Deno,
            }
        );
        assert_eq!(
            UpstreamTarget::parse("/opt/mcp/server.js").unwrap(),
            UpstreamTarget::Script {
                path: "/opt/mcp/server.js".to_string(),
                interpreter: Interpreter::Node,
            }
        );
        assert_eq!(
            UpstreamTarget::parse("../tools/server.py").unwrap(),
            UpstreamTarget::Script {
                path: "../tools/server.py".to_string(),
                interpreter: Interpreter::Python,
            }
        );
    }

    #[test]
    fn test_parse_suffix_without_path_marker_is_module() {
        // A recognized suffix alone does not make a local file reference
        assert_eq!(
            UpstreamTarget::parse("server.ts").unwrap(),
            UpstreamTarget::Module {
                name: "server.ts".to_string()
            }
        );
    }

    #[test]
    fn test_parse_local_executable() {
        assert_eq!(
            UpstreamTarget::parse("/usr/local/bin/my-server").unwrap(),
            UpstreamTarget::Executable {
                path: "/usr/local/bin/my-server".to_string()
            }
        );
    }

    #[test]
    fn test_parse_packages() {
        assert_eq!(
            UpstreamTarget::parse("npm:@modelcontextprotocol/server-everything").unwrap(),
            UpstreamTarget::Package {
                registry: PackageRegistry::Npm,
                name: "@modelcontextprotocol/server-everything".to_string(),
            }
        );
        assert_eq!(
            UpstreamTarget::parse("jsr:@scope/server").unwrap(),
            UpstreamTarget::Package {
                registry: PackageRegistry::Jsr,
                name: "@scope/server".to_string(),
            }
        );
        assert_eq!(
            UpstreamTarget::parse("pypi:mcp-server-time").unwrap().kind(),
            "package"
        );
    }

    #[test]
    fn test_parse_remote() {
        assert_eq!(
            UpstreamTarget::parse("https://learn.microsoft.com/api/mcp").unwrap(),
            UpstreamTarget::Remote {
                url: "https://learn.microsoft.com/api/mcp".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_empty_targets() {
        assert!(matches!(
            UpstreamTarget::parse("   "),
            Err(WrapperError::UnsupportedTarget(_))
        ));
        assert!(matches!(
            UpstreamTarget::parse("npm:"),
            Err(WrapperError::UnsupportedTarget(_))
        ));
    }

    #[test]
    fn test_launch_commands() {
        let deno = UpstreamTarget::parse("./test-server.ts")
            .unwrap()
            .launch_command()
            .unwrap();
        assert_eq!(deno.program, "deno");
        assert_eq!(
            deno.args,
            vec![
                "run",
                "--allow-read",
                "--allow-write",
                "--allow-run",
                "--allow-net",
                "./test-server.ts"
            ]
        );

        let node = UpstreamTarget::parse("./server.js")
            .unwrap()
            .launch_command()
            .unwrap();
        assert_eq!(node, LaunchCommand::new("node", &["./server.js"]));

        let npx = UpstreamTarget::parse("npm:server-pkg")
            .unwrap()
            .launch_command()
            .unwrap();
        assert_eq!(npx, LaunchCommand::new("npx", &["-y", "server-pkg"]));

        let jsr = UpstreamTarget::parse("jsr:@scope/server")
            .unwrap()
            .launch_command()
            .unwrap();
        assert_eq!(
            jsr,
            LaunchCommand::new("deno", &["run", "-A", "jsr:@scope/server"])
        );

        let exe = UpstreamTarget::parse("./my-server")
            .unwrap()
            .launch_command()
            .unwrap();
        assert_eq!(exe, LaunchCommand::new("./my-server", &[]));
    }

    #[test]
    fn test_no_launch_command_for_in_process_and_remote() {
        assert!(UpstreamTarget::parse("demo")
            .unwrap()
            .launch_command()
            .is_none());
        assert!(UpstreamTarget::parse("http://localhost:8080/mcp")
            .unwrap()
            .launch_command()
            .is_none());
    }
}

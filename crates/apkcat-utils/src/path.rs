use std::{env, iter::Peekable, path::PathBuf, str::Chars};

use crate::error::{PathError, PathResult};

pub trait PathResolver {
    /// Resolves a path string that may contain environment variables
    ///
    /// Expands `$VAR` and `${VAR}`, replaces a leading `~` with the home directory and makes
    /// relative paths absolute against the current working directory.
    ///
    /// # Errors
    ///
    /// * [`PathError::Empty`] if the path is empty
    /// * [`PathError::CurrentDir`] if the current directory cannot be determined
    /// * [`PathError::MissingEnvVar`] if a referenced variable is undefined
    /// * [`PathError::UnclosedVariable`] if a `${` is never closed
    ///
    /// # Example
    ///
    /// ```
    /// use apkcat_utils::error::PathResult;
    /// use apkcat_utils::path::{PathResolver, SystemPathResolver};
    ///
    /// fn main() -> PathResult<()> {
    ///     let resolved = SystemPathResolver.resolve_path("/srv/apkcat/packages.json")?;
    ///     assert!(resolved.is_absolute());
    ///     Ok(())
    /// }
    /// ```
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf>;

    /// Returns the user's home directory.
    ///
    /// Uses `HOME`, falling back to `/home/$USER`.
    fn home_dir(&self) -> PathBuf;

    /// Returns `XDG_CONFIG_HOME`, defaulting to `$HOME/.config`.
    fn xdg_config_home(&self) -> PathBuf;
}

/// The default [`PathResolver`] implementation backed by the process environment.
pub struct SystemPathResolver;

impl PathResolver for SystemPathResolver {
    fn resolve_path(&self, path: &str) -> PathResult<PathBuf> {
        let path = path.trim();

        if path.is_empty() {
            return Err(PathError::Empty);
        }

        let path_buf = PathBuf::from(self.expand_variables(path)?);

        if path_buf.is_absolute() {
            Ok(path_buf)
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(path_buf))
                .map_err(|err| PathError::CurrentDir { source: err })
        }
    }

    fn home_dir(&self) -> PathBuf {
        env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| {
            let user = env::var("USER")
                .or_else(|_| env::var("LOGNAME"))
                .unwrap_or_default();
            PathBuf::from(format!("/home/{user}"))
        })
    }

    fn xdg_config_home(&self) -> PathBuf {
        env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.home_dir().join(".config"))
    }
}

impl SystemPathResolver {
    fn expand_variables(&self, path: &str) -> PathResult<String> {
        let mut result = String::with_capacity(path.len());
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '$' if chars.peek() == Some(&'{') => {
                    chars.next();
                    let var_name = Self::consume_braced(&mut chars)?;
                    self.push_env_var(&var_name, &mut result, path)?;
                }
                '$' => {
                    let var_name = Self::consume_var_name(&mut chars);
                    if var_name.is_empty() {
                        result.push('$');
                    } else {
                        self.push_env_var(&var_name, &mut result, path)?;
                    }
                }
                '~' if result.is_empty() => result.push_str(&self.home_dir().to_string_lossy()),
                _ => result.push(c),
            }
        }

        Ok(result)
    }

    fn consume_braced(chars: &mut Peekable<Chars>) -> PathResult<String> {
        let mut var_name = String::new();
        for c in chars.by_ref() {
            if c == '}' {
                return Ok(var_name);
            }
            var_name.push(c);
        }

        Err(PathError::UnclosedVariable {
            input: format!("${{{var_name}"),
        })
    }

    fn consume_var_name(chars: &mut Peekable<Chars>) -> String {
        let mut var_name = String::new();
        while let Some(c) = chars.next_if(|c| c.is_alphanumeric() || *c == '_') {
            var_name.push(c);
        }
        var_name
    }

    fn push_env_var(&self, var_name: &str, result: &mut String, original: &str) -> PathResult<()> {
        match var_name {
            "HOME" => result.push_str(&self.home_dir().to_string_lossy()),
            "XDG_CONFIG_HOME" => result.push_str(&self.xdg_config_home().to_string_lossy()),
            _ => {
                let value = env::var(var_name).map_err(|_| {
                    PathError::MissingEnvVar {
                        var: var_name.into(),
                        input: original.into(),
                    }
                })?;
                result.push_str(&value);
            }
        }
        Ok(())
    }
}

/// Resolves a path string using [`SystemPathResolver`].
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    SystemPathResolver.resolve_path(path)
}

/// Returns the user's home directory using [`SystemPathResolver`].
pub fn home_dir() -> PathBuf {
    SystemPathResolver.home_dir()
}

/// Returns the user's config directory using [`SystemPathResolver`].
pub fn xdg_config_home() -> PathBuf {
    SystemPathResolver.xdg_config_home()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_expand_variables() {
        env::set_var("APKCAT_TEST_VAR", "mirror");
        let resolver = SystemPathResolver;

        assert_eq!(
            resolver.expand_variables("$APKCAT_TEST_VAR/out").unwrap(),
            "mirror/out"
        );
        assert_eq!(
            resolver.expand_variables("${APKCAT_TEST_VAR}/out").unwrap(),
            "mirror/out"
        );
        assert!(resolver.expand_variables("${APKCAT_TEST_VAR").is_err());
        assert!(resolver
            .expand_variables("$APKCAT_VAR_THAT_DOES_NOT_EXIST")
            .is_err());

        env::remove_var("APKCAT_TEST_VAR");
    }

    #[test]
    #[serial]
    fn test_expand_variables_edge_cases() {
        env::set_var("HOME", "/tmp/home");
        let resolver = SystemPathResolver;

        assert_eq!(resolver.expand_variables("path/$").unwrap(), "path/$");
        assert_eq!(
            resolver.expand_variables("path/$!odd").unwrap(),
            "path/$!odd"
        );
        assert_eq!(resolver.expand_variables("~/x").unwrap(), "/tmp/home/x");
        assert_eq!(resolver.expand_variables("a/~/b").unwrap(), "a/~/b");
    }

    #[test]
    #[serial]
    fn test_resolve_path() {
        env::set_var("HOME", "/tmp/home");
        let resolver = SystemPathResolver;

        assert!(matches!(resolver.resolve_path("  "), Err(PathError::Empty)));
        assert_eq!(
            resolver.resolve_path("/srv/packages.json").unwrap(),
            PathBuf::from("/srv/packages.json")
        );
        assert_eq!(
            resolver.resolve_path("packages.json").unwrap(),
            env::current_dir().unwrap().join("packages.json")
        );
        assert_eq!(
            resolver.resolve_path("~/packages.json").unwrap(),
            PathBuf::from("/tmp/home/packages.json")
        );
    }

    #[test]
    #[serial]
    fn test_xdg_config_home() {
        env::set_var("HOME", "/tmp/home");
        env::remove_var("XDG_CONFIG_HOME");
        assert_eq!(xdg_config_home(), PathBuf::from("/tmp/home/.config"));

        env::set_var("XDG_CONFIG_HOME", "/tmp/config");
        assert_eq!(xdg_config_home(), PathBuf::from("/tmp/config"));
        env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    #[serial]
    fn test_home_dir_fallback() {
        let old_home = env::var("HOME").ok();
        env::remove_var("HOME");
        env::set_var("USER", "builder");

        assert_eq!(home_dir(), PathBuf::from("/home/builder"));

        if let Some(home) = old_home {
            env::set_var("HOME", home);
        }
    }
}

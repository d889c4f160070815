use clap::{Command, ValueEnum};
use clap_complete::{Shell as CompleteShell, generate};
use std::io;

use crate::location::CD_FILE_ENV;

pub const BIN_NAME: &str = "sherpa-worktree";
pub const FUNCTION_NAME: &str = "swt";

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

/// Generate shell integration for the specified shell
pub fn generate_shell_integration(shell: Shell) {
    print!("{}", shell_integration(shell));
}

/// Generate native shell completions using clap
pub fn generate_completions(shell: Shell, cmd: &mut Command) {
    let clap_shell = match shell {
        Shell::Bash => CompleteShell::Bash,
        Shell::Zsh => CompleteShell::Zsh,
        Shell::Fish => CompleteShell::Fish,
    };

    generate(
        clap_shell,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

/// The wrapper function: runs the binary with a cd file and follows it
#[must_use]
pub fn shell_integration(shell: Shell) -> String {
    match shell {
        Shell::Bash => posix_integration("Bash", &bash_completion()),
        Shell::Zsh => posix_integration("Zsh", &zsh_completion()),
        Shell::Fish => fish_integration(),
    }
}

fn posix_integration(shell_label: &str, completion: &str) -> String {
    format!(
        r#"# sherpa-worktree shell integration for {shell_label}
# `{func}` runs {bin} and changes into the directory it reports

{func}() {{
    local cd_file exit_code
    cd_file="$(mktemp "${{TMPDIR:-/tmp}}/{bin}.XXXXXX")" || return 1
    {env}="$cd_file" command {bin} "$@"
    exit_code=$?
    if [ -s "$cd_file" ]; then
        cd "$(cat "$cd_file")" || exit_code=1
    fi
    rm -f "$cd_file"
    return $exit_code
}}

{completion}
"#,
        shell_label = shell_label,
        func = FUNCTION_NAME,
        bin = BIN_NAME,
        env = CD_FILE_ENV,
        completion = completion,
    )
}

fn bash_completion() -> String {
    format!(
        r#"if command -v {bin} >/dev/null 2>&1; then
    eval "$({bin} --completions bash 2>/dev/null)"
    complete -F _{bash_fn} -o bashdefault -o default {func}
fi"#,
        bin = BIN_NAME,
        bash_fn = BIN_NAME.replace('-', "__"),
        func = FUNCTION_NAME,
    )
}

fn zsh_completion() -> String {
    format!(
        r#"if command -v {bin} >/dev/null 2>&1 && (( $+functions[compdef] )); then
    eval "$({bin} --completions zsh 2>/dev/null)"
    compdef _{bin} {func}
fi"#,
        bin = BIN_NAME,
        func = FUNCTION_NAME,
    )
}

fn fish_integration() -> String {
    format!(
        r#"# sherpa-worktree shell integration for Fish
# `{func}` runs {bin} and changes into the directory it reports

function {func} --description 'Create, list and clean up git worktrees'
    set -l cd_file (mktemp "/tmp/{bin}.XXXXXX"); or return 1
    env {env}=$cd_file {bin} $argv
    set -l exit_code $status
    if test -s $cd_file
        cd (cat $cd_file); or set exit_code 1
    end
    rm -f $cd_file
    return $exit_code
end

if command -q {bin}
    {bin} --completions fish 2>/dev/null | source
    complete -c {func} -w {bin}
end
"#,
        func = FUNCTION_NAME,
        bin = BIN_NAME,
        env = CD_FILE_ENV,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posix_integration_uses_cd_file() {
        for shell in [Shell::Bash, Shell::Zsh] {
            let script = shell_integration(shell);
            assert!(script.contains("swt() {"));
            assert!(script.contains("SHERPA_WORKTREE_CD_FILE=\"$cd_file\" command sherpa-worktree \"$@\""));
            assert!(script.contains("${TMPDIR:-/tmp}"));
            assert!(script.contains("return $exit_code"));
        }
    }

    #[test]
    fn test_completion_hooks_per_shell() {
        assert!(shell_integration(Shell::Bash).contains("complete -F _sherpa__worktree -o bashdefault"));
        assert!(shell_integration(Shell::Zsh).contains("compdef _sherpa-worktree swt"));
        assert!(shell_integration(Shell::Fish).contains("complete -c swt -w sherpa-worktree"));
    }

    #[test]
    fn test_fish_integration() {
        let script = shell_integration(Shell::Fish);
        assert!(script.contains("function swt"));
        assert!(script.contains("env SHERPA_WORKTREE_CD_FILE=$cd_file sherpa-worktree $argv"));
        assert!(!script.contains("{{"));
    }
}

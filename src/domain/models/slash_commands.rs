#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .trim()
            .split(' ')
            .filter(|e| return !e.is_empty())
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args[0].to_string();
        args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_help()
            || cmd.is_back()
            || cmd.is_new_ticket()
            || cmd.is_history()
            || cmd.is_resume()
            || cmd.is_attach()
            || cmd.is_mic()
            || cmd.is_panel()
        {
            return Some(cmd);
        }

        return None;
    }

    /// Arguments joined back together, for values that may contain spaces
    /// such as categories and file paths.
    pub fn arg_text(&self) -> String {
        return self.args.join(" ");
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    pub fn is_back(&self) -> bool {
        return ["/b", "/back", "/menu"].contains(&self.command.as_str());
    }

    pub fn is_new_ticket(&self) -> bool {
        return ["/n", "/new"].contains(&self.command.as_str());
    }

    pub fn is_history(&self) -> bool {
        return ["/t", "/tickets", "/history"].contains(&self.command.as_str());
    }

    pub fn is_resume(&self) -> bool {
        return ["/r", "/resume"].contains(&self.command.as_str());
    }

    pub fn is_attach(&self) -> bool {
        return ["/a", "/attach"].contains(&self.command.as_str());
    }

    pub fn is_mic(&self) -> bool {
        return ["/m", "/mic"].contains(&self.command.as_str());
    }

    pub fn is_panel(&self) -> bool {
        return ["/p", "/panel"].contains(&self.command.as_str());
    }
}

use syn::{
    parse::{Parse, ParseStream},
    Expr,
    Ident,
    Result,
    Token,
};

/// The tags accepted by the `error` attribute.
#[derive(Debug, Default)]
pub struct ErrorArgs {
    pub message: Option<Expr>,
    pub labels: Option<Expr>,
    pub help: Option<Expr>,
    pub note: Option<Expr>,
}

impl ErrorArgs {
    /// Parses one `tag = expr` pair and stores it.
    fn parse_arg(&mut self, input: ParseStream) -> Result<()> {
        let ident: Ident = input.parse()?;
        input.parse::<Token![=]>()?;

        let slot = match ident.to_string().as_str() {
            "message" => &mut self.message,
            "labels" => &mut self.labels,
            "help" => &mut self.help,
            "note" => &mut self.note,
            other => return Err(syn::Error::new_spanned(&ident, format!("unknown tag `{}`", other))),
        };
        if slot.is_some() {
            return Err(syn::Error::new_spanned(&ident, format!("duplicate tag `{}`", ident)));
        }
        *slot = Some(input.parse()?);

        Ok(())
    }
}

impl Parse for ErrorArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut args = ErrorArgs::default();

        while !input.is_empty() {
            args.parse_arg(input)?;
            if input.is_empty() {
                break;
            }
            input.parse::<Token![,]>()?;
        }

        if args.message.is_none() {
            return Err(input.error("the `message` tag is required"));
        }

        Ok(args)
    }
}

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;

fn is_skipped(field: &syn::Field) -> syn::Result<bool> {
    for attr in field.attrs.iter() {
        if attr.path.is_ident("save_state") {
            let arg = attr.parse_args::<syn::Ident>()?;
            if arg == "skip" {
                return Ok(true);
            }
            return Err(syn::Error::new_spanned(
                arg,
                "unknown save_state attribute, expected `skip`",
            ));
        }
    }
    Ok(false)
}

fn get_struct_fields(
    struct_fields: &syn::Fields,
) -> syn::Result<(Vec<TokenStream2>, Vec<TokenStream2>)> {
    let mut ser_expr = vec![];
    let mut deser_expr = vec![];
    for (i, field) in struct_fields.iter().enumerate() {
        if is_skipped(field)? {
            continue;
        }
        let member = match &field.ident {
            Some(ident) => quote::quote!(#ident),
            None => {
                let i = syn::Index::from(i);
                quote::quote!(#i)
            }
        };
        ser_expr.push(quote::quote! {
            save_state::InSaveState::serialize(&self.#member, state)
        });
        deser_expr.push(quote::quote! {
            save_state::InSaveState::deserialize(&mut self.#member, state)?
        });
    }
    Ok((ser_expr, deser_expr))
}

fn derive_struct(
    derive_input: &syn::DeriveInput,
    fields: &syn::Fields,
) -> syn::Result<TokenStream2> {
    let (impl_generics, ty_generics, where_clause) = derive_input.generics.split_for_impl();
    let ty_name = &derive_input.ident;
    let (ser_expr, deser_expr) = get_struct_fields(fields)?;
    Ok(quote::quote!(
        impl #impl_generics save_state::InSaveState
                for #ty_name #ty_generics #where_clause {
            fn serialize(&self, state: &mut save_state::SaveStateSerializer) {
                #(#ser_expr;)*
            }

            fn deserialize(
                &mut self,
                state: &mut save_state::SaveStateDeserializer,
            ) -> save_state::Result<()> {
                #(#deser_expr;)*
                Ok(())
            }
        }
    ))
}

/// Unit-only enums are stored as their variant index in one byte
fn derive_unit_enum(
    derive_input: &syn::DeriveInput,
    data: &syn::DataEnum,
) -> syn::Result<TokenStream2> {
    let ty_name = &derive_input.ident;
    if data.variants.len() > 0x100 {
        return Err(syn::Error::new_spanned(
            derive_input,
            "enums with more than 256 variants are not supported",
        ));
    }
    let mut variants = vec![];
    for variant in data.variants.iter() {
        if !matches!(variant.fields, syn::Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "only unit variants can be derived, implement `InSaveState` by hand",
            ));
        }
        variants.push(&variant.ident);
    }
    let indices = (0..variants.len()).map(|i| i as u8).collect::<Vec<_>>();
    let ty_str = ty_name.to_string();
    let (impl_generics, ty_generics, where_clause) = derive_input.generics.split_for_impl();
    Ok(quote::quote!(
        impl #impl_generics save_state::InSaveState
                for #ty_name #ty_generics #where_clause {
            fn serialize(&self, state: &mut save_state::SaveStateSerializer) {
                let i: u8 = match self {
                    #(Self::#variants => #indices,)*
                };
                save_state::InSaveState::serialize(&i, state)
            }

            fn deserialize(
                &mut self,
                state: &mut save_state::SaveStateDeserializer,
            ) -> save_state::Result<()> {
                let mut i: u8 = 0;
                save_state::InSaveState::deserialize(&mut i, state)?;
                *self = match i {
                    #(#indices => Self::#variants,)*
                    value => {
                        return Err(save_state::SaveStateError::InvalidDiscriminant {
                            ty: #ty_str,
                            value,
                        })
                    }
                };
                Ok(())
            }
        }
    ))
}

#[proc_macro_derive(InSaveState, attributes(save_state))]
pub fn derive_in_save_state(input: TokenStream) -> TokenStream {
    let derive_input = match syn::parse::<syn::DeriveInput>(input) {
        Ok(derive_input) => derive_input,
        Err(err) => return err.to_compile_error().into(),
    };
    let result = match &derive_input.data {
        syn::Data::Struct(data) => derive_struct(&derive_input, &data.fields),
        syn::Data::Enum(data) => derive_unit_enum(&derive_input, data),
        syn::Data::Union(_) => Err(syn::Error::new_spanned(
            &derive_input,
            format!("expected struct or enum, got union `{}`", derive_input.ident),
        )),
    };
    match result {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

#[proc_macro_derive(DefaultByNew)]
pub fn derive_default_by_new(input_struct: TokenStream) -> TokenStream {
    let derive_input = match syn::parse::<syn::DeriveInput>(input_struct) {
        Ok(derive_input) => derive_input,
        Err(err) => return err.to_compile_error().into(),
    };
    let (impl_generics, ty_generics, where_clause) = derive_input.generics.split_for_impl();
    let ty_name = &derive_input.ident;
    quote::quote! {
        impl #impl_generics Default for #ty_name #ty_generics #where_clause {
            fn default() -> Self {
                Self::new()
            }
        }
    }
    .into()
}

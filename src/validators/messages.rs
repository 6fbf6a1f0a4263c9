//! Message catalog
//!
//! Renders validation message keys (`cvc-*`, `cos-*`, identity-constraint
//! keys) with their positional arguments.

use std::collections::HashMap;

lazy_static::lazy_static! {
    static ref MESSAGES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        // datatypes
        m.insert("cvc-datatype-valid.1.2.1", "'{0}' is not a valid value for '{1}'.");
        m.insert("cvc-datatype-valid.1.2.2", "'{0}' is not a valid value of list type '{1}'.");
        m.insert("cvc-datatype-valid.1.2.3", "'{0}' is not a valid value of union type '{1}'.");
        m.insert("UndeclaredPrefix", "Cannot resolve '{0}' as a QName: the prefix is not declared.");
        m.insert("cvc-pattern-valid", "Value '{0}' is not facet-valid with respect to pattern '{1}' for type '{2}'.");
        m.insert("cvc-enumeration-valid", "Value '{0}' is not facet-valid with respect to enumeration '{1}'. It must be a value from the enumeration.");
        m.insert("cvc-length-valid", "Value '{0}' with length = '{1}' is not facet-valid with respect to length '{2}' for type '{3}'.");
        m.insert("cvc-minLength-valid", "Value '{0}' with length = '{1}' is not facet-valid with respect to minLength '{2}' for type '{3}'.");
        m.insert("cvc-maxLength-valid", "Value '{0}' with length = '{1}' is not facet-valid with respect to maxLength '{2}' for type '{3}'.");
        m.insert("cvc-minInclusive-valid", "Value '{0}' is not facet-valid with respect to minInclusive '{1}' for type '{2}'.");
        m.insert("cvc-maxInclusive-valid", "Value '{0}' is not facet-valid with respect to maxInclusive '{1}' for type '{2}'.");
        m.insert("cvc-minExclusive-valid", "Value '{0}' is not facet-valid with respect to minExclusive '{1}' for type '{2}'.");
        m.insert("cvc-maxExclusive-valid", "Value '{0}' is not facet-valid with respect to maxExclusive '{1}' for type '{2}'.");
        // attributes
        m.insert("cvc-attribute.3", "The value '{2}' of attribute '{1}' on element '{0}' is not valid with respect to its type, '{3}'.");
        m.insert("cvc-attribute.4", "The value '{2}' of attribute '{1}' on element '{0}' is not valid with respect to its fixed value constraint. The attribute must have a value of '{3}'.");
        m.insert("cvc-complex-type.3.1", "Value '{2}' of attribute '{1}' of element '{0}' is not valid with respect to the corresponding attribute use. Attribute '{1}' has a fixed value of '{3}'.");
        m.insert("cvc-complex-type.3.2.2", "Attribute '{1}' is not allowed to appear in element '{0}'.");
        m.insert("cvc-complex-type.4", "Attribute '{1}' must appear on element '{0}'.");
        m.insert("cvc-complex-type.5.1", "In element '{0}', attribute '{1}' is a Wildcard ID. But there is already a Wildcard ID '{2}'. There can be only one.");
        m.insert("cvc-complex-type.5.2", "In element '{0}', attribute '{1}' is a Wildcard ID. But there is already an attribute '{2}' derived from ID among the attribute uses.");
        // content
        m.insert("cvc-complex-type.2.1", "Element '{0}' must have no character or element information item children, because the type's content type is empty.");
        m.insert("cvc-complex-type.2.2", "Element '{0}' must have no element children, and the value must be valid.");
        m.insert("cvc-complex-type.2.3", "Element '{0}' cannot have character children, because the type's content type is element-only.");
        m.insert("cvc-complex-type.2.4.a", "Invalid content was found starting with element '{0}'. One of '{1}' is expected.");
        m.insert("cvc-complex-type.2.4.b", "The content of element '{0}' is not complete. One of '{1}' is expected.");
        m.insert("cvc-complex-type.2.4.c", "The matching wildcard is strict, but no declaration can be found for element '{0}'.");
        m.insert("cvc-complex-type.2.4.d", "Invalid content was found starting with element '{0}'. No child element is expected at this point.");
        m.insert("cvc-complex-type.2.4.e", "'{0}' can occur a maximum of '{2}' times in the current sequence. This limit was exceeded. At this point one of '{1}' is expected.");
        m.insert("cvc-complex-type.2.4.f", "'{0}' can occur a maximum of '{1}' times in the current sequence. This limit was exceeded. No child element is expected at this point.");
        m.insert("cvc-complex-type.2.4.g", "Invalid content was found starting with element '{0}'. '{1}' is expected to occur a minimum of '{2}' times in the current sequence. One more instance is required to satisfy this constraint.");
        m.insert("cvc-complex-type.2.4.j", "Invalid content was found starting with element '{0}'. '{1}' is expected to occur a minimum of '{2}' times in the current sequence. {3} more instances are required to satisfy this constraint.");
        // elements and types
        m.insert("cvc-elt.1.a", "Cannot find the declaration of element '{0}'.");
        m.insert("cvc-elt.2", "The value of abstract in the element declaration for '{0}' must be false.");
        m.insert("cvc-elt.3.1", "Attribute '{1}' must not appear on element '{0}', because the nillable property of '{0}' is false.");
        m.insert("cvc-elt.3.2.1", "Element '{0}' cannot have character or element information children, because '{1}' is specified.");
        m.insert("cvc-elt.3.2.2", "There must be no fixed value constraint for element '{0}', because '{1}' is specified.");
        m.insert("cvc-elt.4.1", "The value '{2}' of attribute '{1}' of element '{0}' is not a valid QName.");
        m.insert("cvc-elt.4.2", "Cannot resolve '{1}' to a type definition for element '{0}'.");
        m.insert("cvc-elt.4.3", "Type '{1}' is not validly derived from the type definition, '{2}', of element '{0}'.");
        m.insert("cvc-elt.5.2.2.1", "Element '{0}' must have no element children because it has a fixed value constraint.");
        m.insert("cvc-elt.5.2.2.2.1", "The value '{1}' of element '{0}' does not match the fixed value constraint value '{2}'.");
        m.insert("cvc-elt.5.2.2.2.2", "The value '{1}' of element '{0}' does not match the fixed value constraint value '{2}'.");
        m.insert("cvc-type.2", "The type definition cannot be abstract for element {0}.");
        m.insert("cvc-type.3.1.1", "Element '{0}' is a simple type, so it cannot have attributes other than schema-instance attributes.");
        m.insert("cvc-type.3.1.2", "Element '{0}' is a simple type, so it must have no element information item children.");
        m.insert("cvc-type.3.1.3", "The value '{1}' of element '{0}' is not valid.");
        m.insert("src-resolve", "Cannot resolve the name '{0}' to a(n) '{1}' component.");
        // ID/IDREF
        m.insert("cvc-id.1", "There is no ID/IDREF binding for IDREF '{0}'.");
        m.insert("cvc-id.2", "There are multiple occurrences of ID value '{0}'.");
        // identity constraints
        m.insert("cvc-identity-constraint.3", "Field '{0}' of identity constraint '{1}' matches element '{2}', but this element does not have a simple type.");
        m.insert("DuplicateUnique", "cvc-identity-constraint.4.1: Duplicate unique value [{0}] declared for identity constraint '{2}' of element '{1}'.");
        m.insert("DuplicateKey", "cvc-identity-constraint.4.2.2: Duplicate key value [{0}] declared for identity constraint '{2}' of element '{1}'.");
        m.insert("AbsentKeyValue", "cvc-identity-constraint.4.2.1.a: Element '{0}' has no value for the key '{1}'.");
        m.insert("KeyNotEnoughValues", "cvc-identity-constraint.4.2.1.b: Not enough values specified for key '{1}' specified for element '{0}'.");
        m.insert("KeyMatchesNillable", "cvc-identity-constraint.4.2.3: Element '{0}' has the key '{1}' which matches an element which has nillable set to true.");
        m.insert("KeyNotFound", "cvc-identity-constraint.4.3: Key '{0}' with value '{1}' not found for identity constraint of element '{2}'.");
        m.insert("KeyRefOutOfScope", "Identity constraint error: identity constraint '{0}' has a keyref which refers to a key or unique that is out of scope.");
        m.insert("FieldMultipleMatch", "Identity constraint error: field '{0}' matches more than one value within the scope of its selector; fields must match unique values.");
        // schema constraints
        m.insert("cos-nonambig", "{0} and {1} (or elements from their substitution group) violate Unique Particle Attribution. During validation against this schema, ambiguity would be created for those two particles.");
        m.insert("cos-element-consistent", "Error for type '{0}'. Multiple elements with name '{1}', with different types, appear in the model group.");
        m
    };
}

/// Render a message key with its arguments.
///
/// Unknown keys render as the key followed by the arguments.
pub fn format_message(key: &str, args: &[String]) -> String {
    match MESSAGES.get(key) {
        Some(template) => {
            let mut message = (*template).to_string();
            for (i, arg) in args.iter().enumerate() {
                message = message.replace(&format!("{{{}}}", i), arg);
            }
            if key.starts_with("cvc-") || key.starts_with("cos-") || key.starts_with("src-") {
                format!("{}: {}", key, message)
            } else {
                message
            }
        }
        None if args.is_empty() => key.to_string(),
        None => format!("{}: {}", key, args.join(", ")),
    }
}

/// Whether a key is in the catalog
pub fn is_known_key(key: &str) -> bool {
    MESSAGES.contains_key(key)
}

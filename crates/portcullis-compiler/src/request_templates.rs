//! Default mapping templates of templated Lambda integrations.

use std::collections::BTreeMap;

/// Token in the default templates replaced by the configured Cognito claims.
pub const CLAIMS_PLACEHOLDER: &str = "extraCognitoPoolClaims";

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const LOOP_MACRO: &str = r#"  #define( $loop )
    {
    #foreach($key in $map.keySet())
        "$util.escapeJavaScript($key)":
          "$util.escapeJavaScript($map.get($key))"
          #if( $foreach.hasNext ) , #end
    #end
    }
  #end
"#;

const FORM_BODY_MACRO: &str = r##"  #define( $body )
    {
    #foreach( $token in $input.path('$').split('&') )
      #set( $keyVal = $token.split('=') )
      #set( $keyValSize = $keyVal.size() )
      #if( $keyValSize >= 1 )
        #set( $key = $util.escapeJavaScript($util.urlDecode($keyVal[0])) )
        #if( $keyValSize >= 2 )
          #set( $val = $util.escapeJavaScript($util.urlDecode($keyVal[1])) )
        #else
          #set( $val = '' )
        #end
        "$key": "$val"#if($foreach.hasNext),#end
      #end
    #end
    }
  #end
"##;

const REQUEST_BODY: &str = r#"  {
    "body": BODY_EXPRESSION,
    "method": "$context.httpMethod",
    "principalId": "$context.authorizer.principalId",
    "stage": "$context.stage",

    "cognitoPoolClaims" : {
       extraCognitoPoolClaims
       "sub": "$context.authorizer.claims.sub"
    },

    #set( $map = $input.params().header )
    "headers": $loop,

    #set( $map = $input.params().querystring )
    "query": $loop,

    #set( $map = $input.params().path )
    "path": $loop,

    #set( $map = $context.identity )
    "identity": $loop,

    #set( $map = $stageVariables )
    "stageVariables": $loop
  }
"#;

/// Render one claim as a template entry.
///
/// Namespaced claims such as `custom:score` are exposed under their suffix.
fn claim_entry(claim: &str) -> String {
    match claim.split_once(':') {
        Some((_, name)) => format!(
            "\"{}\": \"$context.authorizer.claims['{}']\"",
            name, claim
        ),
        None => format!("\"{}\": \"$context.authorizer.claims.{}\"", claim, claim),
    }
}

/// Substitute the claims placeholder with the given claims.
///
/// With no claims the placeholder is dropped.
pub fn with_claims(template: &str, claims: &[String]) -> String {
    let rendered = if claims.is_empty() {
        String::new()
    } else {
        let entries: Vec<String> = claims.iter().map(|c| claim_entry(c)).collect();
        format!("{},", entries.join(","))
    };
    template.replace(CLAIMS_PLACEHOLDER, &rendered)
}

fn json_template() -> String {
    format!(
        "\n{}\n{}",
        LOOP_MACRO,
        REQUEST_BODY.replace("BODY_EXPRESSION", "$input.json(\"$\")")
    )
}

fn form_template() -> String {
    format!(
        "\n{}\n{}\n{}",
        FORM_BODY_MACRO,
        LOOP_MACRO,
        REQUEST_BODY.replace("BODY_EXPRESSION", "$body")
    )
}

/// Default request templates keyed by content type, claims applied.
pub fn default_request_templates(claims: &[String]) -> BTreeMap<String, String> {
    BTreeMap::from([
        (JSON_CONTENT_TYPE.to_string(), with_claims(&json_template(), claims)),
        (FORM_CONTENT_TYPE.to_string(), with_claims(&form_template(), claims)),
    ])
}
